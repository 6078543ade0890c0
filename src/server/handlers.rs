//! Request handlers.
//!
//! `/process` runs one request end to end: read the multipart form,
//! validate it, store the PDF in a temp file, extract its text, dispatch
//! and render. Every outcome is a rendered view; only the status changes.

use super::AppState;
use crate::dispatch::Request;
use crate::error::PdfDeskError;
use crate::operation::Operation;
use crate::pipeline::extract::extract_text;
use crate::pipeline::upload::{UploadForm, UploadedDocument};
use crate::render::DeskView;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::time::Instant;
use tracing::{info, warn};

/// `GET /`
pub async fn index() -> Html<String> {
    Html(DeskView::empty().render_html())
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `POST /process`
pub async fn process(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let start = Instant::now();

    let form = match multipart {
        Ok(multipart) => read_form(multipart, state.config.max_upload_bytes).await,
        Err(rejection) => Err(PdfDeskError::InvalidForm(rejection.body_text())),
    };
    let form = match form {
        Ok(form) => form,
        Err(e) => return error_response(&e, None, None),
    };

    let selected: Option<Operation> = form.option.as_deref().and_then(|o| o.parse().ok());
    let query = form.user_query.clone();

    match run(&state, form).await {
        Ok(view) => {
            info!("Request served in {:?}", start.elapsed());
            (StatusCode::OK, Html(view.render_html())).into_response()
        }
        Err(e) => error_response(&e, selected, query.as_deref()),
    }
}

/// Validate, store, extract, dispatch. The temp file lives until this returns.
async fn run(state: &AppState, form: UploadForm) -> Result<DeskView, PdfDeskError> {
    let submission = form.validate()?;
    info!(
        "Processing '{}' on a {} byte upload",
        submission.operation,
        submission.pdf.len()
    );

    let document = UploadedDocument::persist(&submission.pdf)?;
    let text = extract_text(state.loader.clone(), document.path()).await?;

    let result = state
        .dispatcher
        .dispatch(Request {
            operation: submission.operation,
            text,
            query: submission.query.clone(),
        })
        .await?;

    Ok(DeskView::from_result(result)
        .with_form(Some(submission.operation), submission.query.as_deref()))
}

/// Collect the known fields; anything else is ignored.
async fn read_form(mut multipart: Multipart, limit_bytes: usize) -> Result<UploadForm, PdfDeskError> {
    let mut form = UploadForm::default();
    let read_err = |e: MultipartError| form_error(e, limit_bytes);

    while let Some(field) = multipart.next_field().await.map_err(read_err)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("option") => form.option = Some(field.text().await.map_err(read_err)?),
            Some("user_query") => form.user_query = Some(field.text().await.map_err(read_err)?),
            Some("pdf_file") => form.pdf_file = Some(field.bytes().await.map_err(read_err)?.to_vec()),
            _ => {}
        }
    }
    Ok(form)
}

fn form_error(e: MultipartError, limit_bytes: usize) -> PdfDeskError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PdfDeskError::UploadTooLarge { limit_bytes }
    } else {
        PdfDeskError::InvalidForm(e.body_text())
    }
}

/// HTTP status for a request-ending error.
pub fn status_for(err: &PdfDeskError) -> StatusCode {
    match err {
        PdfDeskError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        e if e.is_inference_error() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &PdfDeskError, selected: Option<Operation>, query: Option<&str>) -> Response {
    let status = status_for(err);
    warn!("Request failed ({}): {}", status, err);
    let view = DeskView::from_error(err).with_form(selected, query);
    (status, Html(view.render_html())).into_response()
}
