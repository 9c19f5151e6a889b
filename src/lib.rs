//! Terminal dashboard and CLI for the LocalPlace container-management API

pub mod app;
pub mod cli;
pub mod core;
pub mod screens;
pub mod utils;
