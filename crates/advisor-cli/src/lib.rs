//! Command-line front end for the advisor engine.
//!
//! - [`args`] - clap definitions
//! - [`cli`] - entry point and routing
//! - [`commands`] - handlers for prioritize, recommend and templates
//! - [`completion`] - completion engine that shells out to an external program
//! - [`output`] - colored and JSON rendering

pub mod args;
pub mod cli;
pub mod commands;
pub mod completion;
pub mod output;
