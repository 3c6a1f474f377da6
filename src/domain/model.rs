use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::LiftoverError;

/// 清單為空時顯示的文字
pub const NOT_AVAILABLE: &str = "Not Available";
/// 欄位缺失時的佔位值
pub const MISSING_FIELD: &str = "N/A";
/// 註解查詢失敗時的標記
pub const ERROR_MARKER: &str = "Error";

/// A chromosome label plus a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicCoordinate {
    pub chromosome: String,
    pub position: u64,
}

impl GenomicCoordinate {
    pub fn new(chromosome: impl Into<String>, position: u64) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
        }
    }
}

impl fmt::Display for GenomicCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionDirection {
    #[serde(rename = "37_to_38")]
    Grch37ToGrch38,
    #[serde(rename = "38_to_37")]
    Grch38ToGrch37,
}

impl ConversionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grch37ToGrch38 => "37_to_38",
            Self::Grch38ToGrch37 => "38_to_37",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Grch37ToGrch38 => "GRCh37 (hg19) → GRCh38 (hg38)",
            Self::Grch38ToGrch37 => "GRCh38 (hg38) → GRCh37 (hg19)",
        }
    }
}

impl FromStr for ConversionDirection {
    type Err = LiftoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "37_to_38" => Ok(Self::Grch37ToGrch38),
            "38_to_37" => Ok(Self::Grch38ToGrch37),
            other => Err(LiftoverError::invalid_input(
                "conversion_type",
                format!("unknown conversion '{}', expected 37_to_38 or 38_to_37", other),
            )),
        }
    }
}

impl fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a liftover. `target` is the first (best scoring) candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub source: GenomicCoordinate,
    pub target: Option<GenomicCoordinate>,
    pub candidates: Vec<GenomicCoordinate>,
}

impl ConversionResult {
    pub fn from_candidates(source: GenomicCoordinate, candidates: Vec<GenomicCoordinate>) -> Self {
        Self {
            source,
            target: candidates.first().cloned(),
            candidates,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub gene_names: Vec<String>,
    pub variant_ids: Vec<String>,
}

impl AnnotationRecord {
    /// 查詢失敗時回傳的標記紀錄
    pub fn error() -> Self {
        Self {
            gene_names: vec![ERROR_MARKER.to_string()],
            variant_ids: vec![ERROR_MARKER.to_string()],
        }
    }

    pub fn is_error(&self) -> bool {
        self == &Self::error()
    }

    pub fn gene_names_display(&self) -> String {
        join_or_not_available(&self.gene_names)
    }

    pub fn variant_ids_display(&self) -> String {
        join_or_not_available(&self.variant_ids)
    }
}

fn join_or_not_available(values: &[String]) -> String {
    if values.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        values.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlleleFrequency {
    Observed(f64),
    NotAvailable,
}

impl fmt::Display for AlleleFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observed(af) => write!(f, "{}", af),
            Self::NotAvailable => f.write_str(MISSING_FIELD),
        }
    }
}

impl Serialize for AlleleFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Observed(af) => serializer.serialize_f64(*af),
            Self::NotAvailable => serializer.serialize_str(MISSING_FIELD),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRecord {
    pub variant_id: String,
    pub genome_af: AlleleFrequency,
    pub exome_af: AlleleFrequency,
}

/// One line of a batch result. Rows are independent of each other.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    pub source: GenomicCoordinate,
    pub target: Option<GenomicCoordinate>,
    pub annotation: Option<AnnotationRecord>,
}

/// How an external client reacts when its service misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log and return an empty or sentinel value.
    DegradeToEmpty,
    /// Hand the error to the caller.
    Propagate,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegradeToEmpty => f.write_str("degrade_to_empty"),
            Self::Propagate => f.write_str("propagate"),
        }
    }
}
