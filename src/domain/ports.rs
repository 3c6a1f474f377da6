use crate::domain::model::{AnnotationRecord, FrequencyRecord, GenomicCoordinate};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Gene/variant overlap lookup for a single base.
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    async fn lookup(&self, coordinate: &GenomicCoordinate) -> Result<AnnotationRecord>;
}

/// Population allele-frequency lookup for one exact variant.
#[async_trait]
pub trait FrequencySource: Send + Sync {
    async fn lookup(
        &self,
        gene_symbol: &str,
        position: u64,
        ref_allele: &str,
        alt_allele: &str,
    ) -> Result<Option<FrequencyRecord>>;
}
