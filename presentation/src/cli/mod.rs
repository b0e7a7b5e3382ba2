//! Command-line definitions and argument conversion

pub mod commands;
pub mod input;
