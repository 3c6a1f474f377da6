//! Liftover between GRCh37 (hg19) and GRCh38 (hg38) driven by UCSC chain files.
//!
//! Chain files can be downloaded from:
//! - <https://hgdownload.soe.ucsc.edu/goldenPath/hg19/liftOver/hg19ToHg38.over.chain.gz>
//! - <https://hgdownload.soe.ucsc.edu/goldenPath/hg38/liftOver/hg38ToHg19.over.chain.gz>

pub mod chain;
pub mod converter;

pub use chain::{Chain, ChainFile};
pub use converter::{ensembl_name, ucsc_name, ChainMappings, CoordinateConverter};
