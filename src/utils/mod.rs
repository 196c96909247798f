//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `hookrelay` application.
//!
//! It centralizes the error types shared by the relay and the clients, and the
//! one-shot logging setup used by the binary and by tests.

pub mod error;
pub mod logging;

pub use error::{ClientError, RelayError};

#[cfg(test)]
mod tests;
