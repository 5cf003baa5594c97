//! Terminal front end: input pipeline, screens, persistence and settings.

pub mod app;
pub mod cli;
pub mod config;
pub mod keys;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod terminal;
pub mod theme;
pub mod view;
