// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod logging;
pub mod opts;
pub mod settings;

pub use logging::*;
pub use opts::*;
pub use settings::*;
