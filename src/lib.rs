pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod notifier;
pub mod practicum;
pub mod status;
pub mod watcher;
