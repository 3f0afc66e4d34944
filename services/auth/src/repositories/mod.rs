//! Database repositories for the authentication service

pub mod admin;

pub use admin::AdminRepository;
