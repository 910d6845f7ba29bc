//! Registry Mirror Library
//!
//! This file serves as the library root for the registry-mirror crate,
//! organizing and exposing the modules that make up the application.

pub mod catalog;
pub mod cli;
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod reference;
pub mod report;
pub mod transfer;

pub use config::MirrorConfig;
pub use error::{MirrorError, Result};
pub use logging::Logger;
