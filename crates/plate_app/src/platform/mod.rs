//! Terminal front end: wires the pure core to the engine, storage and stdout.
mod app;
mod config;
mod effects;
mod logging;
mod persistence;
mod ui;

pub use app::run_app;
