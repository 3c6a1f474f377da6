//! Gene and variant annotations from the Ensembl REST overlap endpoint.

use crate::domain::model::MISSING_FIELD;
use crate::domain::{AnnotationRecord, AnnotationSource, FailurePolicy, GenomicCoordinate};
use crate::liftover::ensembl_name;
use crate::utils::error::{LiftoverError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_ENSEMBL_SERVER: &str = "https://rest.ensembl.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlapFeature {
    Gene,
    Variation,
}

impl OverlapFeature {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Gene => "gene",
            Self::Variation => "variation",
        }
    }
}

/// Only the fields we read; Ensembl returns many more.
#[derive(Debug, Deserialize)]
struct OverlapRecord {
    external_name: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnsemblClient {
    client: Client,
    server: String,
    policy: FailurePolicy,
}

impl EnsemblClient {
    pub fn new(server: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            client: Client::new(),
            server: server.into().trim_end_matches('/').to_string(),
            policy,
        }
    }

    fn region_url(&self, coordinate: &GenomicCoordinate) -> String {
        let chromosome = ensembl_name(coordinate.chromosome.trim());
        format!(
            "{}/overlap/region/human/{}:{}-{}",
            self.server, chromosome, coordinate.position, coordinate.position
        )
    }

    async fn fetch_feature(
        &self,
        coordinate: &GenomicCoordinate,
        feature: OverlapFeature,
    ) -> Result<Vec<String>> {
        let url = self.region_url(coordinate);
        tracing::debug!("Making Ensembl request to: {}?feature={}", url, feature.as_str());

        let response = self
            .client
            .get(&url)
            .query(&[("feature", feature.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Ensembl response status: {}", status);

        if !status.is_success() {
            if self.policy == FailurePolicy::Propagate {
                let body = response.text().await.unwrap_or_default();
                return Err(LiftoverError::UpstreamStatusError {
                    service: "Ensembl".to_string(),
                    status: status.as_u16(),
                    body,
                });
            }
            // 非 2xx 視為沒有資料
            return Ok(Vec::new());
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<OverlapRecord> = serde_json::from_str(&body)?;
        Ok(records
            .into_iter()
            .map(|record| {
                let value = match feature {
                    OverlapFeature::Gene => record.external_name,
                    OverlapFeature::Variation => record.id,
                };
                value.unwrap_or_else(|| MISSING_FIELD.to_string())
            })
            .collect())
    }

    async fn fetch_record(&self, coordinate: &GenomicCoordinate) -> Result<AnnotationRecord> {
        let gene_names = self.fetch_feature(coordinate, OverlapFeature::Gene).await?;
        let variant_ids = self
            .fetch_feature(coordinate, OverlapFeature::Variation)
            .await?;
        Ok(AnnotationRecord {
            gene_names,
            variant_ids,
        })
    }
}

#[async_trait]
impl AnnotationSource for EnsemblClient {
    async fn lookup(&self, coordinate: &GenomicCoordinate) -> Result<AnnotationRecord> {
        match self.fetch_record(coordinate).await {
            Ok(record) => Ok(record),
            Err(e) if self.policy == FailurePolicy::DegradeToEmpty => {
                tracing::warn!("⚠️ Error fetching annotations for {}: {}", coordinate, e);
                Ok(AnnotationRecord::error())
            }
            Err(e) => Err(e),
        }
    }
}
