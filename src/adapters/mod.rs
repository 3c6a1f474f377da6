// Adapters layer: concrete clients for the external annotation services.

pub mod ensembl;
pub mod gnomad;

pub use ensembl::EnsemblClient;
pub use gnomad::GnomadClient;
