//! Configuration loading for Scout.

mod settings;

pub use settings::*;
