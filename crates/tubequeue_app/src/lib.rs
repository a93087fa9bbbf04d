//! `tubequeue` command-line front end: argument parsing, settings
//! persistence and text rendering around the engine.
pub mod cli;
pub mod commands;
pub mod persistence;
pub mod render;
