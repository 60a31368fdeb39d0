pub mod activity;
pub mod config;
pub mod context;
pub mod drill;
pub mod init;
pub mod plan;
pub mod play;
pub mod roster;
pub mod scout;
pub mod whoami;
