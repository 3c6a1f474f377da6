use crate::domain::{
    AnnotationRecord, AnnotationSource, BatchRow, ConversionDirection, ConversionResult,
    GenomicCoordinate,
};
use crate::liftover::CoordinateConverter;
use crate::utils::error::Result;
use std::sync::Arc;

/// Result of one single-coordinate lookup.
#[derive(Debug, Clone)]
pub struct SingleLookup {
    pub direction: ConversionDirection,
    pub conversion: ConversionResult,
    /// Annotation of the converted coordinate; `None` when unmapped.
    pub converted_annotation: Option<AnnotationRecord>,
    /// Annotation of the submitted coordinate, only when requested.
    pub original_annotation: Option<AnnotationRecord>,
}

/// Conversion followed by annotation, for one coordinate or a whole batch.
pub struct LiftoverPipeline<A: AnnotationSource> {
    converter: Arc<CoordinateConverter>,
    annotator: A,
}

impl<A: AnnotationSource> LiftoverPipeline<A> {
    pub fn new(converter: Arc<CoordinateConverter>, annotator: A) -> Self {
        Self {
            converter,
            annotator,
        }
    }

    pub fn converter(&self) -> &CoordinateConverter {
        &self.converter
    }

    pub fn annotator(&self) -> &A {
        &self.annotator
    }

    pub async fn lookup(
        &self,
        direction: ConversionDirection,
        coordinate: &GenomicCoordinate,
        annotate_source: bool,
    ) -> Result<SingleLookup> {
        let conversion = self.converter.convert(direction, coordinate);

        let Some(target) = conversion.target.clone() else {
            tracing::info!("❌ {} could not be converted ({})", coordinate, direction);
            return Ok(SingleLookup {
                direction,
                conversion,
                converted_annotation: None,
                original_annotation: None,
            });
        };

        tracing::info!("✅ {} -> {} ({})", coordinate, target, direction);

        let original_annotation = if annotate_source {
            Some(self.annotator.lookup(coordinate).await?)
        } else {
            None
        };
        let converted_annotation = Some(self.annotator.lookup(&target).await?);

        Ok(SingleLookup {
            direction,
            conversion,
            converted_annotation,
            original_annotation,
        })
    }

    /// 逐列處理，一次一列，不並行
    pub async fn run_batch(
        &self,
        direction: ConversionDirection,
        coordinates: &[GenomicCoordinate],
    ) -> Result<Vec<BatchRow>> {
        tracing::info!("Processing batch of {} rows ({})", coordinates.len(), direction);
        let mut rows = Vec::with_capacity(coordinates.len());
        let mut unmapped = 0usize;

        for coordinate in coordinates {
            let conversion = self.converter.convert(direction, coordinate);
            let annotation = match &conversion.target {
                Some(target) => Some(self.annotator.lookup(target).await?),
                None => {
                    unmapped += 1;
                    None
                }
            };
            rows.push(BatchRow {
                source: conversion.source,
                target: conversion.target,
                annotation,
            });
        }

        tracing::info!(
            "Batch finished: {} converted, {} unmapped",
            rows.len() - unmapped,
            unmapped
        );
        Ok(rows)
    }
}
