//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, CSV rendering and helper functions.

pub mod csv;
pub mod errors;
pub mod logging;
pub mod helpers;

pub use errors::{ShepherdError, Result};
