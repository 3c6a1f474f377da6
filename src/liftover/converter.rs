//! Coordinate conversion between GRCh37 and GRCh38.
//!
//! Positions are 1-based at this API and 0-based inside the chain tables.

use super::chain::ChainFile;
use crate::domain::{ConversionDirection, ConversionResult, GenomicCoordinate};
use crate::utils::error::Result;
use std::path::Path;

/// The two preloaded mapping tables, one per direction.
///
/// Built once at start-up and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ChainMappings {
    pub grch37_to_38: ChainFile,
    pub grch38_to_37: ChainFile,
}

impl ChainMappings {
    pub fn new(grch37_to_38: ChainFile, grch38_to_37: ChainFile) -> Self {
        Self {
            grch37_to_38,
            grch38_to_37,
        }
    }

    pub fn from_files<P: AsRef<Path>>(grch37_to_38: P, grch38_to_37: P) -> Result<Self> {
        let forward = ChainFile::from_file(grch37_to_38)?;
        let reverse = ChainFile::from_file(grch38_to_37)?;
        Ok(Self::new(forward, reverse))
    }

    fn table(&self, direction: ConversionDirection) -> &ChainFile {
        match direction {
            ConversionDirection::Grch37ToGrch38 => &self.grch37_to_38,
            ConversionDirection::Grch38ToGrch37 => &self.grch38_to_37,
        }
    }
}

#[derive(Debug)]
pub struct CoordinateConverter {
    mappings: ChainMappings,
}

impl CoordinateConverter {
    pub fn new(mappings: ChainMappings) -> Self {
        Self { mappings }
    }

    /// Convert a coordinate; the best scoring candidate becomes the target.
    pub fn convert(
        &self,
        direction: ConversionDirection,
        coordinate: &GenomicCoordinate,
    ) -> ConversionResult {
        let candidates = self.convert_all(direction, coordinate);
        if candidates.len() > 1 {
            tracing::debug!(
                "{} maps to {} loci in {}, keeping the first",
                coordinate,
                candidates.len(),
                direction
            );
        }
        ConversionResult::from_candidates(coordinate.clone(), candidates)
    }

    /// Every candidate locus, best chain score first. Empty when unmapped.
    pub fn convert_all(
        &self,
        direction: ConversionDirection,
        coordinate: &GenomicCoordinate,
    ) -> Vec<GenomicCoordinate> {
        let table = self.mappings.table(direction);
        let Some(position) = coordinate.position.checked_sub(1) else {
            return Vec::new();
        };

        let label = coordinate.chromosome.trim();
        let Some(contig) = chain_contig(table, label) else {
            tracing::debug!("No chains for contig '{}' in {}", label, direction);
            return Vec::new();
        };

        let ucsc_style = label.starts_with("chr");
        table
            .chains_covering(&contig, position)
            .into_iter()
            .filter_map(|chain| {
                chain.lift(position).map(|lifted| {
                    GenomicCoordinate::new(
                        display_contig(&chain.query_name, ucsc_style),
                        lifted + 1,
                    )
                })
            })
            .collect()
    }
}

/// 找出 chain 表中實際使用的 contig 名稱
fn chain_contig(table: &ChainFile, label: &str) -> Option<String> {
    if label.is_empty() {
        return None;
    }
    if table.has_contig(label) {
        return Some(label.to_string());
    }
    let alias = ucsc_name(label);
    table.has_contig(&alias).then_some(alias)
}

/// Ensembl-style label to UCSC (`1` -> `chr1`, `MT` -> `chrM`).
pub fn ucsc_name(label: &str) -> String {
    if label.starts_with("chr") {
        return label.to_string();
    }
    match label {
        "MT" | "M" => "chrM".to_string(),
        other => format!("chr{}", other),
    }
}

/// UCSC label to Ensembl style (`chr1` -> `1`, `chrM` -> `MT`).
pub fn ensembl_name(label: &str) -> String {
    match label.strip_prefix("chr") {
        Some("M") | Some("MT") => "MT".to_string(),
        Some(rest) => rest.to_string(),
        None if label == "M" => "MT".to_string(),
        None => label.to_string(),
    }
}

fn display_contig(query_name: &str, ucsc_style: bool) -> String {
    if ucsc_style {
        query_name.to_string()
    } else {
        ensembl_name(query_name)
    }
}
