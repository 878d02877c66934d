//! Library components of the `freight-intake` binary.

pub mod config;
pub mod input;
pub mod logging;
