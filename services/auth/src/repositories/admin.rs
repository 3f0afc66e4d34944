//! Admin repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::Admin;

fn admin_from_row(row: &sqlx::postgres::PgRow) -> Admin {
    Admin {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Admin repository
#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    /// Create a new admin repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an admin by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(admin_from_row))
    }

    /// Find an admin by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(admin_from_row))
    }

    /// Replace an admin's password hash
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        info!("Updating password hash for admin {}", id);

        let result = sqlx::query(
            r#"
            UPDATE admins
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("admin {} not found", id);
        }

        Ok(())
    }
}
