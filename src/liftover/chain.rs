//! UCSC chain file reader.
//!
//! A chain file describes how one assembly (the reference, e.g. hg19) aligns
//! onto another (the query, e.g. hg38). Each chain starts with a header line
//!
//! ```text
//! chain score tName tSize tStrand tStart tEnd qName qSize qStrand qStart qEnd id
//! ```
//!
//! followed by `size dt dq` block lines; the final line of a chain carries only
//! `size`. All coordinates inside the file are 0-based, half-open.

use crate::utils::error::{LiftoverError, Result};
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    fn parse(field: &str, line: usize) -> Result<Self> {
        match field {
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            other => Err(LiftoverError::ChainParseError {
                line,
                message: format!("invalid strand '{}'", other),
            }),
        }
    }
}

/// An ungapped aligned block, stored with absolute start positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AlignedBlock {
    reference_start: u64,
    query_start: u64,
    size: u64,
}

impl AlignedBlock {
    fn reference_end(&self) -> u64 {
        self.reference_start + self.size
    }
}

#[derive(Debug, Clone)]
pub struct Chain {
    pub id: u64,
    pub score: u64,
    pub reference_name: String,
    pub reference_start: u64,
    pub reference_end: u64,
    pub query_name: String,
    pub query_size: u64,
    pub query_strand: Strand,
    pub query_start: u64,
    blocks: Vec<AlignedBlock>,
    // 下一個 block 的起點（解析時使用）
    cursor: (u64, u64),
}

impl Chain {
    pub fn contains(&self, position: u64) -> bool {
        position >= self.reference_start && position < self.reference_end
    }

    /// Lift a 0-based reference position to a 0-based, plus-strand query position.
    ///
    /// Returns `None` when the position is outside the chain or inside a gap.
    pub fn lift(&self, position: u64) -> Option<u64> {
        if !self.contains(position) {
            return None;
        }

        let idx = self
            .blocks
            .partition_point(|block| block.reference_end() <= position);
        let block = self.blocks.get(idx)?;
        if position < block.reference_start {
            return None;
        }

        let query_pos = block.query_start + (position - block.reference_start);
        match self.query_strand {
            Strand::Plus => Some(query_pos),
            Strand::Minus => self.query_size.checked_sub(query_pos + 1),
        }
    }

    fn push_block(&mut self, size: u64, reference_gap: u64, query_gap: u64) {
        let (reference_start, query_start) = self.cursor;
        self.blocks.push(AlignedBlock {
            reference_start,
            query_start,
            size,
        });
        self.cursor = (
            reference_start + size + reference_gap,
            query_start + size + query_gap,
        );
    }
}

/// All chains of one file, indexed by reference contig.
#[derive(Debug, Clone, Default)]
pub struct ChainFile {
    chains: HashMap<String, Vec<Chain>>,
}

impl ChainFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 讀取 chain 檔（支援 .chain 與 .chain.gz）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| LiftoverError::ConfigError {
            message: format!("Failed to open chain file {}: {}", path.display(), e),
        })?;

        if path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
            Self::parse(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Self::parse(BufReader::new(file))
        }
    }

    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut chain_file = ChainFile::new();
        let mut current: Option<Chain> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_num = idx + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("chain") {
                if let Some(chain) = current.take() {
                    chain_file.add_chain(chain);
                }
                current = Some(parse_header(line, line_num)?);
            } else if let Some(chain) = current.as_mut() {
                let (size, reference_gap, query_gap) = parse_block(line, line_num)?;
                chain.push_block(size, reference_gap, query_gap);
            } else {
                return Err(LiftoverError::ChainParseError {
                    line: line_num,
                    message: "alignment data before any chain header".to_string(),
                });
            }
        }

        if let Some(chain) = current {
            chain_file.add_chain(chain);
        }

        Ok(chain_file)
    }

    pub fn add_chain(&mut self, chain: Chain) {
        self.chains
            .entry(chain.reference_name.clone())
            .or_default()
            .push(chain);
    }

    /// Chains covering a 0-based position, best score first.
    pub fn chains_covering(&self, contig: &str, position: u64) -> Vec<&Chain> {
        let mut found: Vec<&Chain> = self
            .chains
            .get(contig)
            .map(|chains| chains.iter().filter(|c| c.contains(position)).collect())
            .unwrap_or_default();
        found.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        found
    }

    pub fn has_contig(&self, contig: &str) -> bool {
        self.chains.contains_key(contig)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }
}

fn parse_number(field: &str, what: &str, line: usize) -> Result<u64> {
    field.parse::<u64>().map_err(|_| LiftoverError::ChainParseError {
        line,
        message: format!("invalid {} '{}'", what, field),
    })
}

fn parse_header(line: &str, line_num: usize) -> Result<Chain> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 12 || parts[0] != "chain" {
        return Err(LiftoverError::ChainParseError {
            line: line_num,
            message: format!("expected at least 12 header fields, got {}", parts.len()),
        });
    }

    if Strand::parse(parts[4], line_num)? != Strand::Plus {
        return Err(LiftoverError::ChainParseError {
            line: line_num,
            message: "reference strand must be '+'".to_string(),
        });
    }

    let reference_start = parse_number(parts[5], "reference start", line_num)?;
    let query_start = parse_number(parts[10], "query start", line_num)?;
    let id = match parts.get(12) {
        Some(field) => parse_number(field, "chain id", line_num)?,
        None => 0,
    };

    Ok(Chain {
        id,
        score: parse_number(parts[1], "score", line_num)?,
        reference_name: parts[2].to_string(),
        reference_start,
        reference_end: parse_number(parts[6], "reference end", line_num)?,
        query_name: parts[7].to_string(),
        query_size: parse_number(parts[8], "query size", line_num)?,
        query_strand: Strand::parse(parts[9], line_num)?,
        query_start,
        blocks: Vec::new(),
        cursor: (reference_start, query_start),
    })
}

fn parse_block(line: &str, line_num: usize) -> Result<(u64, u64, u64)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [size] => Ok((parse_number(size, "block size", line_num)?, 0, 0)),
        [size, dt, dq] => Ok((
            parse_number(size, "block size", line_num)?,
            parse_number(dt, "reference gap", line_num)?,
            parse_number(dq, "query gap", line_num)?,
        )),
        _ => Err(LiftoverError::ChainParseError {
            line: line_num,
            message: format!("expected 1 or 3 block fields, got {}", parts.len()),
        }),
    }
}
