pub mod blueprint;
pub mod config;
pub mod execution;
pub mod init;
pub mod render;
