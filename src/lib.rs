pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::{JsonlStorage, MtdClient, WeatherClient};
pub use crate::config::{cli::CliArgs, CollectorConfig};
pub use crate::core::collector::Collector;
pub use crate::domain::model::{DataKind, RoundSummary};
pub use crate::utils::error::{CollectorError, Result};
