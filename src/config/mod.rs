//! Configuration for the wallaby scheduling engine.

mod settings;

pub use settings::{Config, SchedulingConfig, StorageConfig};
