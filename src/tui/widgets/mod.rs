// src/tui/widgets/mod.rs — Widget sub-modules for each tab panel.

pub mod form;
pub mod overview;
pub mod tasks;
