pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod picker;
pub mod ui;

pub use catalog::{DateSpan, PresetKey};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use picker::{DateRangePicker, RangeChange};
