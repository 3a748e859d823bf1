//! API integration tests
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use toolbox_server::config::Config;
use toolbox_server::routes;
use toolbox_server::state::AppState;

fn test_app() -> Router {
    let state = AppState::new(Config::default()).expect("state init");
    routes::app(state)
}

/// Minimal one-page PDF (MuPDF repairs the approximate xref)
fn minimal_pdf() -> Vec<u8> {
    let pdf_content = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>
endobj
4 0 obj
<< /Length 0 >>
stream
endstream
endobj
xref
0 5
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000226 00000 n
trailer
<< /Size 5 /Root 1 0 R >>
startxref
276
%%EOF";
    pdf_content.to_vec()
}

/// Minimal two-page PDF for exercising the zip export path
fn two_page_pdf() -> Vec<u8> {
    let pdf_content = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R 5 0 R] /Count 2 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>
endobj
4 0 obj
<< /Length 0 >>
stream
endstream
endobj
5 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 6 0 R /Resources << >> >>
endobj
6 0 obj
<< /Length 0 >>
stream
endstream
endobj
xref
0 7
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000121 00000 n
0000000232 00000 n
0000000280 00000 n
0000000391 00000 n
trailer
<< /Size 7 /Root 1 0 R >>
startxref
439
%%EOF";
    pdf_content.to_vec()
}

fn multipart_upload(path: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "toolbox-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
            boundary, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_post(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_youtube_resolve_returns_delegate_formats() {
    let app = test_app();

    let response = app
        .oneshot(json_post(
            "/api/v1/youtube/resolve",
            serde_json::json!({ "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["provider"], "youtube");
    assert_eq!(json["id"], "dQw4w9WgXcQ");
    assert_eq!(
        json["cover"],
        "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
    );
    assert_eq!(json["formats"][0]["kind"], "video");
    assert_eq!(
        json["formats"][0]["url"],
        "https://api.vve.pw/api/button/mp4/dQw4w9WgXcQ"
    );
    assert_eq!(json["formats"][1]["kind"], "audio");
}

#[tokio::test]
async fn test_youtube_resolve_rejects_foreign_url() {
    let app = test_app();

    let response = app
        .oneshot(json_post(
            "/api/v1/youtube/resolve",
            serde_json::json!({ "url": "https://vimeo.com/12345" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_youtube_resolve_rejects_empty_url() {
    let app = test_app();

    let response = app
        .oneshot(json_post(
            "/api/v1/youtube/resolve",
            serde_json::json!({ "url": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tiktok_resolve_rejects_foreign_url() {
    // Rejected before any network traffic is issued
    let app = test_app();

    let response = app
        .oneshot(json_post(
            "/api/v1/tiktok/resolve",
            serde_json::json!({ "url": "https://example.com/video" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pdf_upload_and_detail() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "report.pdf", &minimal_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], "report");
    assert_eq!(json["page_count"], 1);

    let response = app.oneshot(get("/api/v1/pdf/report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["fileStem"], "report");
    assert_eq!(json["pageCount"], 1);
    assert_eq!(json["pageDimensions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pdf_upload_rejects_non_pdf() {
    let app = test_app();

    let response = app
        .oneshot(multipart_upload("/api/v1/pdf", "notes.pdf", b"hello world"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pdf_detail_unknown_id_is_404() {
    let app = test_app();

    let response = app.oneshot(get("/api/v1/pdf/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_render_page_returns_png() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "report.pdf", &minimal_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/v1/pdf/report/pages/1?scale=1.0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    // PNG magic number
    assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
}

#[tokio::test]
async fn test_render_page_out_of_range_is_400() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "report.pdf", &minimal_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/v1/pdf/report/pages/5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_single_page_returns_bare_image() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "report.pdf", &minimal_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/v1/pdf/report/export?pages=1&scale=1.0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains("report_page_1.png"));
}

#[tokio::test]
async fn test_export_all_pages_returns_zip() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "slides.pdf", &two_page_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/v1/pdf/slides/export?scale=1.0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains("slides_pages.zip"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.by_name("slides_page_1.png").is_ok());
    assert!(archive.by_name("slides_page_2.png").is_ok());
}

#[tokio::test]
async fn test_export_rejects_bad_page_selection() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "report.pdf", &minimal_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/v1/pdf/report/export?pages=7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_pdf() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "report.pdf", &minimal_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/pdf/report")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/api/v1/pdf/report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_pdfs() {
    let app = test_app();

    let response = app.clone().oneshot(get("/api/v1/pdf")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 0);

    let response = app
        .clone()
        .oneshot(multipart_upload("/api/v1/pdf", "report.pdf", &minimal_pdf()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/v1/pdf")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["pdfs"][0]["id"], "report");
}
