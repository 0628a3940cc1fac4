//! Configuration value objects

mod app_config;

pub use app_config::{
    AppConfig, TimingConfig, DEFAULT_LOCK_DELAY_MS, DEFAULT_PROGRESS_INTERVAL_MS,
    DEFAULT_TICK_INTERVAL_MS, DEFAULT_VISUALIZER_INTERVAL_MS,
};
