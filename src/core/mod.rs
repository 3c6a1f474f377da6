pub mod batch;
pub mod pipeline;

pub use crate::domain::ports::{AnnotationSource, FrequencySource};
pub use crate::utils::error::Result;
pub use pipeline::{LiftoverPipeline, SingleLookup};
