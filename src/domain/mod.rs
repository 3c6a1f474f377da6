// Domain layer: core models and ports (interfaces). No external dependencies beyond std/serde.

pub mod model;
pub mod ports;

pub use model::{
    AlleleFrequency, AnnotationRecord, BatchRow, ConversionDirection, ConversionResult,
    FailurePolicy, FrequencyRecord, GenomicCoordinate,
};
pub use ports::{AnnotationSource, FrequencySource};
