pub mod auth;
pub mod bootstrap;
pub mod commands;
