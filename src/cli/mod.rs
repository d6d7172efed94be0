//! CLI module for the Scout command-line interface.
//!
//! This module provides the command handlers behind `scout classify`,
//! `scout prepare` and `scout prompt`.

mod commands;
mod output;

pub use commands::*;
