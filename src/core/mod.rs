pub mod etl;
pub mod fetcher;
pub mod flatten;
pub mod sink;

pub use crate::domain::model::{FlattenedRecord, RunReport, TransformResult};
pub use crate::domain::ports::{AttemptSource, Pipeline, RecordSink};
pub use crate::utils::error::Result;
