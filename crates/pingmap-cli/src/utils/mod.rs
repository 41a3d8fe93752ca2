//! Shared CLI helpers.

pub mod logging;
pub mod parsing;

pub use logging::initialize_logging;
