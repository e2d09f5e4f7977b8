pub mod graph;
pub mod setup;
pub mod ui;
