//! Periodic maintenance jobs
//!
//! Two sweeps keep state bounded: rate-limiter entries whose window has
//! passed, and reset tokens past their expiry. Neither has a correctness
//! dependency on its cadence; the defaults run every five minutes.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::rate_limiter::RateLimiter;
use crate::reset::ResetTokenStore;

/// Sweeper configuration
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Cron expression (with seconds field) for both sweep jobs
    pub schedule: String,
}

impl SweeperConfig {
    /// Create a new SweeperConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SWEEP_SCHEDULE`: cron expression (default: "0 */5 * * * *", every 5 minutes)
    pub fn from_env() -> Self {
        let schedule =
            std::env::var("SWEEP_SCHEDULE").unwrap_or_else(|_| "0 */5 * * * *".to_string());
        Self { schedule }
    }
}

/// Start the background sweep jobs
///
/// The returned scheduler must be kept alive for the jobs to keep firing.
pub async fn start(
    config: &SweeperConfig,
    rate_limiter: RateLimiter,
    resets: ResetTokenStore,
) -> Result<JobScheduler> {
    let mut scheduler = JobScheduler::new().await?;

    let limiter = rate_limiter.clone();
    scheduler
        .add(Job::new_async(config.schedule.as_str(), move |_id, _l| {
            let limiter = limiter.clone();
            Box::pin(async move {
                let removed = limiter.sweep().await;
                info!("Rate-limiter sweep finished, {} entries removed", removed);
            })
        })?)
        .await?;

    let store = resets.clone();
    scheduler
        .add(Job::new_async(config.schedule.as_str(), move |_id, _l| {
            let store = store.clone();
            Box::pin(async move {
                match store.sweep_expired().await {
                    Ok(removed) => {
                        info!("Reset-token sweep finished, {} tokens removed", removed);
                    }
                    Err(e) => error!("Reset-token sweep failed: {:#}", e),
                }
            })
        })?)
        .await?;

    scheduler.start().await?;
    info!("Maintenance sweeps scheduled ({})", config.schedule);

    Ok(scheduler)
}
