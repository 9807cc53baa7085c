pub mod config;
pub mod error;
pub mod preferences;
pub mod revoke_client;
pub mod storage;
