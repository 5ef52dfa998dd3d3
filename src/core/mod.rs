pub mod pipeline;
pub mod render;
pub mod report;

pub use crate::domain::model::{OutputFile, TransformResult, TripSnapshot};
pub use crate::domain::ports::{ConfigProvider, InputSource, OutputFormat, Pipeline, Storage};
pub use crate::utils::error::Result;
