//! The `utils` module provides shared definitions used across `tvhub`:
//! the error types returned by fallible operations and the tracing setup.

pub mod error;
pub mod logging;

pub use error::{DeviceError, Error, HubError, Result};
