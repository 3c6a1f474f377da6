use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use liftover_annotator::liftover::ChainFile;
use liftover_annotator::{
    build_router, AppState, ChainMappings, CoordinateConverter, EnsemblClient, FailurePolicy,
    GnomadClient, LiftoverPipeline,
};
use tower::ServiceExt;

// hg19 chr1:10001-20000 對應 hg38 chr1:10051-20050
const HG19_TO_HG38: &str = "chain 5000 chr1 1000000 + 10000 20000 chr1 1000100 + 10050 20050 1\n\
                            10000\n";
const HG38_TO_HG19: &str = "chain 5000 chr1 1000100 + 10050 20050 chr1 1000000 + 10000 20000 1\n\
                            10000\n";

const BOUNDARY: &str = "liftover-test-boundary";

fn converter() -> Arc<CoordinateConverter> {
    Arc::new(CoordinateConverter::new(ChainMappings::new(
        ChainFile::parse(HG19_TO_HG38.as_bytes()).unwrap(),
        ChainFile::parse(HG38_TO_HG19.as_bytes()).unwrap(),
    )))
}

fn app(server: &MockServer) -> Router {
    app_with(server, &server.url("/api"), false)
}

fn app_with(server: &MockServer, gnomad_endpoint: &str, annotate_source: bool) -> Router {
    let state = AppState::new(
        LiftoverPipeline::new(
            converter(),
            EnsemblClient::new(server.base_url(), FailurePolicy::DegradeToEmpty),
        ),
        GnomadClient::new(gnomad_endpoint, "gnomad_r3", FailurePolicy::Propagate),
        annotate_source,
        100,
    );
    build_router(state, 1024 * 1024)
}

fn mock_overlap(server: &MockServer, region: &str, genes: &str, variants: &str) {
    let path = format!("/overlap/region/human/{}", region);
    let genes = genes.to_string();
    let variants = variants.to_string();
    server.mock(|when, then| {
        when.method(GET).path(path.clone()).query_param("feature", "gene");
        then.status(200).body(genes);
    });
    server.mock(|when, then| {
        when.method(GET).path(path).query_param("feature", "variation");
        then.status(200).body(variants);
    });
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(filename: &str, contents: &str, conversion_type: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {contents}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"conversion_type\"\r\n\r\n\
         {conversion_type}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        filename = filename,
        contents = contents,
        conversion_type = conversion_type
    );
    Request::builder()
        .method("POST")
        .uri("/batch")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_and_frequency_pages_render() {
    let server = MockServer::start();

    let response = app(&server)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("action=\"/convert\""));
    assert!(html.contains("action=\"/batch\""));

    let response = app(&server)
        .oneshot(Request::get("/frequency").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("name=\"gene_symbol\""));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start();
    let response = app(&server)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_convert_form_shows_converted_coordinate_and_annotation() {
    let server = MockServer::start();
    mock_overlap(
        &server,
        "1:15050-15050",
        r#"[{"external_name": "WASH7P"}]"#,
        r#"[{"id": "rs1000"}]"#,
    );

    let response = app(&server)
        .oneshot(form_request(
            "/convert",
            "chromosome=1&position=15000&conversion_type=37_to_38",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<td>1:15050</td>"));
    assert!(html.contains("WASH7P"));
    assert!(html.contains("rs1000"));
}

#[tokio::test]
async fn test_convert_form_unmapped_coordinate() {
    let server = MockServer::start();
    let never_called = server.mock(|when, then| {
        when.method(GET);
        then.status(200).body("[]");
    });

    let response = app(&server)
        .oneshot(form_request(
            "/convert",
            "chromosome=chr2&position=500&conversion_type=37_to_38",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Could not convert these coordinates."));
    never_called.assert_hits(0);
}

#[tokio::test]
async fn test_convert_form_rejects_bad_input() {
    let server = MockServer::start();

    let response = app(&server)
        .oneshot(form_request(
            "/convert",
            "chromosome=1&position=abc&conversion_type=37_to_38",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("class=\"error\""));

    let response = app(&server)
        .oneshot(form_request(
            "/convert",
            "chromosome=1&position=15000&conversion_type=19_to_38",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_upload_returns_csv_attachment() {
    let server = MockServer::start();
    mock_overlap(
        &server,
        "1:15050-15050",
        r#"[{"external_name": "WASH7P"}, {"external_name": "MIR6859-1"}]"#,
        "[]",
    );

    let response = app(&server)
        .oneshot(multipart_request(
            "coords.csv",
            "chromosome,position\n1,15000\n2,500",
            "37_to_38",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"converted_coordinates_37_to_38.csv\""
    );

    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "original_chr,original_pos,converted_chr,converted_pos,gene_names,variants"
    );
    assert_eq!(lines[1], "1,15000,1,15050,\"WASH7P, MIR6859-1\",Not Available");
    assert_eq!(lines[2], "2,500,,,,");
}

#[tokio::test]
async fn test_batch_upload_with_bad_row_aborts() {
    let server = MockServer::start();
    let never_called = server.mock(|when, then| {
        when.method(GET);
        then.status(200).body("[]");
    });

    let response = app(&server)
        .oneshot(multipart_request(
            "coords.tsv",
            "chromosome\tposition\n1\t15000\n1\tnot-a-number",
            "37_to_38",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("not-a-number"));
    never_called.assert_hits(0);
}

#[tokio::test]
async fn test_batch_upload_rejects_unsupported_extension() {
    let server = MockServer::start();

    let response = app(&server)
        .oneshot(multipart_request(
            "coords.xlsx",
            "chromosome,position\n1,15000",
            "37_to_38",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response)
        .await
        .contains("Please upload a CSV or TSV file"));
}

#[tokio::test]
async fn test_convert_json_api() {
    let server = MockServer::start();
    mock_overlap(&server, "1:15000-15000", "[]", "[]");
    mock_overlap(&server, "1:15050-15050", "[]", r#"[{"id": "rs2"}]"#);

    let response = app(&server)
        .oneshot(json_request(
            "/api/v1/convert",
            serde_json::json!({
                "chromosome": "chr1",
                "position": 15050,
                "conversion_type": "38_to_37",
                "annotate_original": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["target"]["chromosome"], "chr1");
    assert_eq!(json["target"]["position"], 15000);
    assert_eq!(json["candidates"].as_array().unwrap().len(), 1);
    assert_eq!(json["original_annotation"]["variant_ids"][0], "rs2");
    assert!(json["message"].is_null());
}

#[tokio::test]
async fn test_frequency_form_not_found_and_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(200).json_body(serde_json::json!({
            "data": { "gene": { "variants": [
                { "variant_id": "17-43045712-A-G", "pos": 43045712, "ref": "A", "alt": "G",
                  "genome": { "af": 0.5 }, "exome": null }
            ] } }
        }));
    });

    let response = app(&server)
        .oneshot(form_request(
            "/frequency",
            "gene_symbol=BRCA1&position=43045712&ref_allele=A&alt_allele=G",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("17-43045712-A-G"));
    assert!(html.contains("<tr><th>Exome AF</th><td>N/A</td></tr>"));

    let response = app(&server)
        .oneshot(form_request(
            "/frequency",
            "gene_symbol=BRCA1&position=43045712&ref_allele=A&alt_allele=T",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Variant not found in gnomAD data."));
}

#[tokio::test]
async fn test_frequency_json_upstream_failure_is_bad_gateway() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api");
        then.status(503).body("unavailable");
    });

    let response = app(&server)
        .oneshot(json_request(
            "/api/v1/frequency",
            serde_json::json!({
                "gene_symbol": "BRCA1",
                "position": 43045712,
                "ref_allele": "A",
                "alt_allele": "G"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_convert_json_wrong_type_is_bad_request_with_json_error() {
    let server = MockServer::start();

    let response = app(&server)
        .oneshot(json_request(
            "/api/v1/convert",
            serde_json::json!({
                "chromosome": "1",
                "position": "abc",
                "conversion_type": "37_to_38"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].as_str().unwrap().contains("position"));
}

#[tokio::test]
async fn test_frequency_json_malformed_body_is_bad_request() {
    let server = MockServer::start();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/frequency")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_unreachable_frequency_service_message_is_neutral() {
    let server = MockServer::start();

    // 沒有服務在監聽的埠
    let response = app_with(&server, "http://127.0.0.1:9/api", false)
        .oneshot(json_request(
            "/api/v1/frequency",
            serde_json::json!({
                "gene_symbol": "BRCA1",
                "position": 43045712,
                "ref_allele": "A",
                "alt_allele": "G"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error"], "An external service could not be reached");
}

#[tokio::test]
async fn test_annotate_original_false_overrides_config_default() {
    let server = MockServer::start();
    let source_mock = server.mock(|when, then| {
        when.method(GET).path("/overlap/region/human/1:15000-15000");
        then.status(200).body("[]");
    });
    mock_overlap(&server, "1:15050-15050", "[]", "[]");
    let router = app_with(&server, &server.url("/api"), true);

    let response = router
        .clone()
        .oneshot(json_request(
            "/api/v1/convert",
            serde_json::json!({
                "chromosome": "1",
                "position": 15000,
                "conversion_type": "37_to_38",
                "annotate_original": false
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["original_annotation"].is_null());
    source_mock.assert_hits(0);

    // 未指定時沿用設定檔預設值
    let response = router
        .oneshot(json_request(
            "/api/v1/convert",
            serde_json::json!({
                "chromosome": "1",
                "position": 15000,
                "conversion_type": "37_to_38"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["original_annotation"].is_object());
    source_mock.assert_hits(2);
}
