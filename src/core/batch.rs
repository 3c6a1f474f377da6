//! Reading uploaded coordinate tables and writing batch results.

use crate::domain::{BatchRow, ConversionDirection, GenomicCoordinate};
use crate::utils::error::{LiftoverError, Result};
use crate::utils::validation::parse_position;
use std::path::Path;

pub const CHROMOSOME_COLUMN: &str = "chromosome";
pub const POSITION_COLUMN: &str = "position";

pub const OUTPUT_HEADERS: [&str; 6] = [
    "original_chr",
    "original_pos",
    "converted_chr",
    "converted_pos",
    "gene_names",
    "variants",
];

/// Delimiter chosen from the uploaded file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Csv,
    Tsv,
}

impl BatchFormat {
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("txt") | Some("tsv") => Ok(Self::Tsv),
            _ => Err(LiftoverError::BatchError {
                message: "Please upload a CSV or TSV file".to_string(),
            }),
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| LiftoverError::BatchError {
            message: format!("Missing required column '{}'", name),
        })
}

/// 讀取整個表格；任何一列有誤就整批放棄
pub fn read_coordinates(
    data: &[u8],
    format: BatchFormat,
    max_rows: usize,
) -> Result<Vec<GenomicCoordinate>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let chromosome_idx = column_index(&headers, CHROMOSOME_COLUMN)?;
    let position_idx = column_index(&headers, POSITION_COLUMN)?;

    let mut coordinates = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // 第 1 列是表頭
        let row_num = idx + 2;

        if coordinates.len() >= max_rows {
            return Err(LiftoverError::BatchError {
                message: format!("Batch exceeds the limit of {} rows", max_rows),
            });
        }

        let chromosome = record.get(chromosome_idx).unwrap_or_default();
        if chromosome.is_empty() {
            return Err(LiftoverError::BatchError {
                message: format!("Row {}: chromosome is empty", row_num),
            });
        }

        let raw_position = record.get(position_idx).unwrap_or_default();
        let position = parse_position(POSITION_COLUMN, raw_position).map_err(|_| {
            LiftoverError::BatchError {
                message: format!("Row {}: '{}' is not a valid position", row_num, raw_position),
            }
        })?;

        coordinates.push(GenomicCoordinate::new(chromosome, position));
    }

    Ok(coordinates)
}

pub fn write_results(rows: &[BatchRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(OUTPUT_HEADERS)?;

    for row in rows {
        let (converted_chr, converted_pos) = match &row.target {
            Some(target) => (target.chromosome.clone(), target.position.to_string()),
            None => (String::new(), String::new()),
        };
        let (gene_names, variants) = match &row.annotation {
            Some(annotation) => (
                annotation.gene_names_display(),
                annotation.variant_ids_display(),
            ),
            None => (String::new(), String::new()),
        };

        writer.write_record([
            row.source.chromosome.as_str(),
            row.source.position.to_string().as_str(),
            converted_chr.as_str(),
            converted_pos.as_str(),
            gene_names.as_str(),
            variants.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| LiftoverError::IoError(e.into_error()))
}

pub fn output_filename(direction: ConversionDirection) -> String {
    format!("converted_coordinates_{}.csv", direction.as_str())
}
