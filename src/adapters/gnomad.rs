//! Allele frequencies from the gnomAD GraphQL API.
//!
//! The API cannot filter a gene's variants by allele pair, so every variant of
//! the gene is fetched and the exact (position, ref, alt) match happens here.

use crate::domain::{AlleleFrequency, FailurePolicy, FrequencyRecord, FrequencySource};
use crate::utils::error::{LiftoverError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_GNOMAD_ENDPOINT: &str = "https://gnomad.broadinstitute.org/api";
pub const DEFAULT_GNOMAD_DATASET: &str = "gnomad_r3";

const GENE_VARIANTS_QUERY: &str = r#"
query ($geneSymbol: String!, $dataset: DatasetId!) {
  gene(gene_symbol: $geneSymbol, reference_genome: GRCh38) {
    variants(dataset: $dataset) {
      variant_id
      pos
      ref
      alt
      genome {
        af
      }
      exome {
        af
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GeneData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeneData {
    gene: Option<GeneVariants>,
}

#[derive(Debug, Deserialize)]
struct GeneVariants {
    #[serde(default)]
    variants: Vec<GnomadVariant>,
}

#[derive(Debug, Deserialize)]
struct GnomadVariant {
    variant_id: String,
    pos: u64,
    #[serde(rename = "ref")]
    ref_allele: String,
    alt: String,
    genome: Option<PopulationFrequency>,
    exome: Option<PopulationFrequency>,
}

#[derive(Debug, Deserialize)]
struct PopulationFrequency {
    af: Option<f64>,
}

fn allele_frequency(population: Option<PopulationFrequency>) -> AlleleFrequency {
    population
        .and_then(|p| p.af)
        .map(AlleleFrequency::Observed)
        .unwrap_or(AlleleFrequency::NotAvailable)
}

#[derive(Debug, Clone)]
pub struct GnomadClient {
    client: Client,
    endpoint: String,
    dataset: String,
    policy: FailurePolicy,
}

impl GnomadClient {
    pub fn new(endpoint: impl Into<String>, dataset: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            dataset: dataset.into(),
            policy,
        }
    }

    async fn gene_variants(&self, gene_symbol: &str) -> Result<Vec<GnomadVariant>> {
        let payload = serde_json::json!({
            "query": GENE_VARIANTS_QUERY,
            "variables": {
                "geneSymbol": gene_symbol,
                "dataset": self.dataset,
            }
        });

        tracing::debug!(
            "Querying gnomAD {} for gene {} ({})",
            self.endpoint,
            gene_symbol,
            self.dataset
        );
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LiftoverError::UpstreamStatusError {
                service: "gnomAD".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GraphQlResponse = response.json().await?;
        match parsed.data.and_then(|data| data.gene) {
            Some(gene) => Ok(gene.variants),
            None if !parsed.errors.is_empty() => Err(LiftoverError::UpstreamQueryError {
                service: "gnomAD".to_string(),
                message: parsed
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn find_variant(
        &self,
        gene_symbol: &str,
        position: u64,
        ref_allele: &str,
        alt_allele: &str,
    ) -> Result<Option<FrequencyRecord>> {
        let variants = self.gene_variants(gene_symbol).await?;
        tracing::debug!("gnomAD returned {} variants for {}", variants.len(), gene_symbol);

        // 第一個完全相符的變異即為結果
        Ok(variants
            .into_iter()
            .find(|v| v.pos == position && v.ref_allele == ref_allele && v.alt == alt_allele)
            .map(|v| FrequencyRecord {
                variant_id: v.variant_id,
                genome_af: allele_frequency(v.genome),
                exome_af: allele_frequency(v.exome),
            }))
    }
}

#[async_trait]
impl FrequencySource for GnomadClient {
    async fn lookup(
        &self,
        gene_symbol: &str,
        position: u64,
        ref_allele: &str,
        alt_allele: &str,
    ) -> Result<Option<FrequencyRecord>> {
        match self
            .find_variant(gene_symbol, position, ref_allele, alt_allele)
            .await
        {
            Err(e) if self.policy == FailurePolicy::DegradeToEmpty => {
                tracing::warn!("⚠️ gnomAD lookup for {} failed: {}", gene_symbol, e);
                Ok(None)
            }
            other => other,
        }
    }
}
