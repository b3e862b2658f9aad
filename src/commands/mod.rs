//! CLI commands for notestore

pub mod delete;
pub mod dispatch;
pub mod helpers;
pub mod import;
pub mod init;
pub mod show;
pub mod status;
pub mod touch;
pub mod update;
