//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path)
//! - [`init`] - Configuration initialization
//! - [`run`] - Main command (load sources, join, publish)

pub mod config;
pub mod init;
pub mod run;
