// src/core/mod.rs — Data sources, view model and mutations

pub mod mutations;
pub mod notify;
pub mod polling;
pub mod view_model;
