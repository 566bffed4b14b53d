#![forbid(unsafe_code)]

//! `thiccpaper`: install, start, and stop a `PaperMC` server.
//!
//! The launcher patches `server.properties`, guards against double starts
//! with a liveness marker file, supervises the JVM until it reports
//! readiness, and talks to the running server over RCON.

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod installer;
pub mod marker;
pub mod persist;
pub mod properties;
pub mod rcon;
pub mod registry;
pub mod supervisor;

pub use config::LauncherConfig;
pub use errors::{AppError, Result};
