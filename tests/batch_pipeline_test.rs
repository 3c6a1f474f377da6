use std::io::Write;
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use httpmock::prelude::*;
use liftover_annotator::core::batch::{self, BatchFormat};
use liftover_annotator::utils::validation::Validate;
use liftover_annotator::{
    ChainMappings, ConversionDirection, CoordinateConverter, EnsemblClient, FailurePolicy,
    GenomicCoordinate, LiftoverError, LiftoverPipeline, TomlConfig,
};
use tempfile::TempDir;

// 兩條 chain 覆蓋同一段 hg19 區間，分數高者優先
const HG19_TO_HG38: &str = "chain 5000 chr1 1000000 + 10000 20000 chr1 1000100 + 10050 20050 1\n\
                            10000\n\
                            \n\
                            chain 100 chr1 1000000 + 10000 11000 chr5 900000 + 500 1500 2\n\
                            1000\n\
                            \n\
                            chain 4000 chrX 155270560 + 0 1000 chrX 156040895 - 0 1000 3\n\
                            1000\n";

const HG38_TO_HG19: &str = "chain 5000 chr1 1000100 + 10050 20050 chr1 1000000 + 10000 20000 1\n\
                            10000\n";

fn write_gz(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

fn load_config(dir: &TempDir, ensembl_url: &str) -> TomlConfig {
    let forward = write_gz(dir, "hg19ToHg38.over.chain.gz", HG19_TO_HG38);
    let reverse = dir.path().join("hg38ToHg19.over.chain");
    std::fs::write(&reverse, HG38_TO_HG19).unwrap();

    let content = format!(
        r#"
[liftover]
grch37_to_38 = "{}"
grch38_to_37 = "{}"

[annotation]
server = "{}"
failure_policy = "degrade_to_empty"

[limits]
max_batch_rows = 10
"#,
        forward.display(),
        reverse.display(),
        ensembl_url
    );
    let config = TomlConfig::from_toml_str(&content).unwrap();
    config.validate().unwrap();
    config
}

fn pipeline(config: &TomlConfig) -> LiftoverPipeline<EnsemblClient> {
    let mappings =
        ChainMappings::from_files(&config.liftover.grch37_to_38, &config.liftover.grch38_to_37)
            .unwrap();
    LiftoverPipeline::new(
        Arc::new(CoordinateConverter::new(mappings)),
        EnsemblClient::new(
            config.annotation.server.clone(),
            config.annotation.failure_policy,
        ),
    )
}

#[tokio::test]
async fn test_batch_from_file_to_csv() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let gene_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/overlap/region/human/1:15050-15050")
            .query_param("feature", "gene");
        then.status(200).body(r#"[{"external_name": "WASH7P"}]"#);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/overlap/region/human/1:15050-15050")
            .query_param("feature", "variation");
        then.status(200).body("[]");
    });

    let config = load_config(&temp_dir, &server.base_url());
    let pipeline = pipeline(&config);

    let input = b"position,chromosome,note\n15000,1,first\n99,chr9,unmapped\n";
    let coordinates =
        batch::read_coordinates(input, BatchFormat::Csv, config.limits.max_batch_rows).unwrap();
    assert_eq!(coordinates.len(), 2);

    let rows = pipeline
        .run_batch(ConversionDirection::Grch37ToGrch38, &coordinates)
        .await
        .unwrap();
    gene_mock.assert();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].target, Some(GenomicCoordinate::new("1", 15050)));
    assert!(rows[1].target.is_none());
    assert!(rows[1].annotation.is_none());

    let output = String::from_utf8(batch::write_results(&rows).unwrap()).unwrap();
    assert_eq!(
        output,
        "original_chr,original_pos,converted_chr,converted_pos,gene_names,variants\n\
         1,15000,1,15050,WASH7P,Not Available\n\
         chr9,99,,,,\n"
    );
}

#[tokio::test]
async fn test_failed_annotation_marks_row_as_error() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(200).body("not json");
    });

    let config = load_config(&temp_dir, &server.base_url());
    let rows = pipeline(&config)
        .run_batch(
            ConversionDirection::Grch37ToGrch38,
            &[GenomicCoordinate::new("1", 12000)],
        )
        .await
        .unwrap();

    let output = String::from_utf8(batch::write_results(&rows).unwrap()).unwrap();
    assert!(output.ends_with("1,12000,1,12050,Error,Error\n"));
}

#[tokio::test]
async fn test_multiple_candidates_prefer_highest_score() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_config(&temp_dir, "http://127.0.0.1:9");
    let pipeline = pipeline(&config);

    let result = pipeline.converter().convert(
        ConversionDirection::Grch37ToGrch38,
        &GenomicCoordinate::new("chr1", 10500),
    );
    assert_eq!(result.target, Some(GenomicCoordinate::new("chr1", 10550)));
    assert_eq!(
        result.candidates,
        vec![
            GenomicCoordinate::new("chr1", 10550),
            GenomicCoordinate::new("chr5", 1000),
        ]
    );
}

#[tokio::test]
async fn test_minus_strand_chain() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_config(&temp_dir, "http://127.0.0.1:9");
    let pipeline = pipeline(&config);

    // 0-based 9 在負股上對應 156040895 - 9 - 1
    let result = pipeline.converter().convert(
        ConversionDirection::Grch37ToGrch38,
        &GenomicCoordinate::new("X", 10),
    );
    assert_eq!(result.target, Some(GenomicCoordinate::new("X", 156040886)));
}

#[tokio::test]
async fn test_row_limit_is_enforced() {
    let mut input = String::from("chromosome,position\n");
    for i in 1..=11 {
        input.push_str(&format!("1,{}\n", 10000 + i));
    }

    let err = batch::read_coordinates(input.as_bytes(), BatchFormat::Csv, 10).unwrap_err();
    assert!(matches!(err, LiftoverError::BatchError { .. }));
}

#[test]
fn test_missing_chain_file_is_configuration_error() {
    let err = ChainMappings::from_files("/nonexistent/a.chain", "/nonexistent/b.chain").unwrap_err();
    assert!(matches!(err, LiftoverError::ConfigError { .. }));
}
