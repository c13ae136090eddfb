// src/lib.rs — Library root for TaskMaster

pub mod api;
pub mod cli;
pub mod core;
pub mod infra;
pub mod session;
pub mod tui;
