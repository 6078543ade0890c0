//! Offline tests of the HTTP surface.
//!
//! The router runs in-process via `tower::ServiceExt::oneshot`, with
//! scripted pipelines and a fake document loader in place of pdfium and
//! the inference backend.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use edgequake_pdfdesk::{
    create_router, AppState, DeskConfig, DocumentLoader, InferenceError, PdfDeskError, Pipelines,
    Task, TextPipeline,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BOUNDARY: &str = "pdfdesk-test-boundary";
const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Echoes its input (generation returns a fixed, repetitive list); fails
/// on the given 1-indexed call.
struct Echo {
    label: &'static str,
    calls: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl Echo {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            calls: Mutex::new(Vec::new()),
            fail_on_call: None,
        })
    }

    fn failing(label: &'static str, call: usize) -> Arc<Self> {
        Arc::new(Self {
            label,
            calls: Mutex::new(Vec::new()),
            fail_on_call: Some(call),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextPipeline for Echo {
    fn name(&self) -> &str {
        self.label
    }

    async fn run(&self, task: Task<'_>) -> Result<String, InferenceError> {
        let input = match task {
            Task::Answer { question, .. } => question.to_string(),
            Task::Summarize { text, .. } | Task::Translate { text, .. } => text.to_string(),
            Task::Generate { prompt, .. } => prompt.to_string(),
        };
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(input.clone());
            calls.len()
        };
        if self.fail_on_call == Some(n) {
            return Err(InferenceError::RateLimited {
                pipeline: self.label.to_string(),
                retry_after_secs: Some(30),
            });
        }
        match task {
            Task::Generate { .. } => Ok(" Q1?\n Q2?\nQ1?\n".to_string()),
            _ => Ok(format!("{}({})", self.label, input)),
        }
    }
}

/// Returns fixed pages (or a parse error) and remembers which paths it was
/// asked to read.
struct FakeLoader {
    pages: Vec<String>,
    parse_error: Option<&'static str>,
    seen: Mutex<Vec<PathBuf>>,
}

impl FakeLoader {
    fn new(pages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            parse_error: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn broken(detail: &'static str) -> Arc<Self> {
        Arc::new(Self {
            pages: Vec::new(),
            parse_error: Some(detail),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl DocumentLoader for FakeLoader {
    fn load_pages(&self, path: &Path) -> Result<Vec<String>, PdfDeskError> {
        assert!(path.exists(), "upload must exist while it is being read");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        self.seen.lock().unwrap().push(path.to_path_buf());
        match self.parse_error {
            Some(detail) => Err(PdfDeskError::DocumentParse {
                detail: detail.to_string(),
            }),
            None => Ok(self.pages.clone()),
        }
    }
}

struct Fixture {
    qa: Arc<Echo>,
    summary: Arc<Echo>,
    translation: Arc<Echo>,
    generation: Arc<Echo>,
    loader: Arc<FakeLoader>,
}

impl Fixture {
    fn new(pages: &[&str]) -> Self {
        Self {
            qa: Echo::new("qa"),
            summary: Echo::new("sum"),
            translation: Echo::new("tr"),
            generation: Echo::new("gen"),
            loader: FakeLoader::new(pages),
        }
    }

    fn app(&self, config: DeskConfig) -> axum::Router {
        let pipelines = Pipelines::from_parts(
            self.qa.clone(),
            self.summary.clone(),
            self.translation.clone(),
            self.generation.clone(),
        );
        create_router(AppState::new(config, pipelines, self.loader.clone()))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"doc.pdf\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post(app: axum::Router, parts: &[Part<'_>]) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/process")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_renders_empty_form() {
    let fx = Fixture::new(&[]);
    let response = fx
        .app(DeskConfig::default())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("Generate Questions"));
    assert!(!html.contains("class=\"error\""));
}

#[tokio::test]
async fn health_is_ok() {
    let fx = Fixture::new(&[]);
    let response = fx
        .app(DeskConfig::default())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn summarize_uses_joined_page_text() {
    let fx = Fixture::new(&["first page", "second page"]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Summarize PDF"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fx.summary.calls(), vec!["first page second page"]);
    assert!(html.contains("sum(first page second page)"));
    assert!(fx.translation.calls().is_empty());
}

#[tokio::test]
async fn temp_file_is_removed_after_request() {
    let fx = Fixture::new(&["text"]);
    let (status, _) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Summarize PDF"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let seen = fx.loader.seen();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists());
}

#[tokio::test]
async fn temp_file_is_removed_when_extraction_fails() {
    let mut fx = Fixture::new(&[]);
    fx.loader = FakeLoader::broken("xref table missing");
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Summarize PDF"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("Could not read the PDF: xref table missing"));
    assert!(fx.summary.calls().is_empty());

    let seen = fx.loader.seen();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists());
}

#[tokio::test]
async fn temp_file_is_removed_when_inference_fails() {
    let mut fx = Fixture::new(&["abcdefgh"]);
    fx.translation = Echo::failing("tr", 1);
    let config = DeskConfig::builder()
        .translation_chunk_width(4)
        .build()
        .unwrap();

    let (status, html) = post(
        fx.app(config),
        &[
            Part::Text("option", "Translate PDF"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(fx.translation.calls(), vec!["abcd"]);
    assert!(html.contains("(chunk 1/2)"));

    let seen = fx.loader.seen();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists());
}

#[tokio::test]
async fn question_answering_passes_query() {
    let fx = Fixture::new(&["Ada wrote the notes."]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Question and Answer"),
            Part::Text("user_query", "Who wrote the notes?"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fx.qa.calls(), vec!["Who wrote the notes?"]);
    assert!(html.contains("qa(Who wrote the notes?)"));
    assert!(html.contains("value=\"Who wrote the notes?\""));
}

#[tokio::test]
async fn question_answering_without_query_is_400() {
    let fx = Fixture::new(&["text"]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Question and Answer"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("user_query"));
    assert!(fx.loader.seen().is_empty());
    assert!(fx.qa.calls().is_empty());
}

#[tokio::test]
async fn missing_file_is_400() {
    let fx = Fixture::new(&["text"]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[Part::Text("option", "Summarize PDF")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("No file uploaded."));
}

#[tokio::test]
async fn unknown_option_is_400() {
    let fx = Fixture::new(&["text"]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[Part::Text("option", "Dance"), Part::File("pdf_file", PDF)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("Unknown operation"));
}

#[tokio::test]
async fn non_pdf_upload_is_400() {
    let fx = Fixture::new(&["text"]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Summarize PDF"),
            Part::File("pdf_file", b"GIF89a..."),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("not a PDF"));
}

#[tokio::test]
async fn translation_failure_on_chunk_two_of_three_is_an_error_view() {
    let mut fx = Fixture::new(&["abcdefghij"]);
    fx.translation = Echo::failing("tr", 2);
    let config = DeskConfig::builder()
        .translation_chunk_width(4)
        .build()
        .unwrap();

    let (status, html) = post(
        fx.app(config),
        &[
            Part::Text("option", "Translate PDF"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(fx.translation.calls(), vec!["abcd", "efgh"]);
    assert!(html.contains("An error occurred during translation (chunk 2/3)"));
    assert!(!html.contains("tr(abcd)"));
}

#[tokio::test]
async fn generated_questions_are_deduplicated() {
    let fx = Fixture::new(&["some text"]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Generate Questions"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fx.generation.calls().len(), 1);
    assert!(html.contains("<pre>Q1?\nQ2?</pre>"));
}

#[tokio::test]
async fn empty_document_generates_empty_question_block() {
    let fx = Fixture::new(&[]);
    let (status, html) = post(
        fx.app(DeskConfig::default()),
        &[
            Part::Text("option", "Generate Questions"),
            Part::File("pdf_file", PDF),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(fx.generation.calls().is_empty());
    assert!(html.contains("Generated Questions"));
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let fx = Fixture::new(&["text"]);
    let config = DeskConfig::builder().max_upload_bytes(64).build().unwrap();
    let big = [PDF, &[b'x'; 1024][..]].concat();

    let (status, html) = post(
        fx.app(config),
        &[
            Part::Text("option", "Summarize PDF"),
            Part::File("pdf_file", &big),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(html.contains("too large"));
}
