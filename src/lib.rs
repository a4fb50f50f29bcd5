pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::pipelines::attempt_pipeline::AttemptPipeline;
pub use config::AppConfig;
pub use core::{etl::EtlEngine, fetcher::HttpFetcher, sink::PostgresSink};
pub use domain::model::{FlattenedRecord, RunReport};
pub use utils::error::{EtlError, Result};
