//! Report relay core library.
//!
//! Accepts vulnerability report requests over HTTP, renders them to PDF with
//! `rr-report` and uploads the result to a fixed chat:
//! - Exit codes for CLI operations
//! - Environment configuration
//! - Structured logging
//! - Messaging API delivery client
//! - Request pipeline and HTTP server
//! - Graceful shutdown on SIGINT/SIGTERM
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod delivery;
pub mod exit_codes;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod signals;
