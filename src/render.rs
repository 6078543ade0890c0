//! The single HTML view: upload form plus at most one result or error.

use crate::dispatch::OperationResult;
use crate::error::PdfDeskError;
use crate::operation::Operation;
use askama::Template;
use tracing::warn;

/// One `<option>` of the operation selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    pub value: &'static str,
    pub selected: bool,
}

/// View model for `templates/index.html`.
///
/// At most one of `answer`, `summary`, `translation`, `questions` and
/// `error` is set.
#[derive(Debug, Clone, Template)]
#[template(path = "index.html")]
pub struct DeskView {
    pub options: Vec<OptionRow>,
    pub query: String,
    pub answer: Option<String>,
    pub summary: Option<String>,
    pub translation: Option<String>,
    pub questions: Option<String>,
    pub error: Option<String>,
}

impl DeskView {
    /// Blank form, first operation selected.
    pub fn empty() -> Self {
        Self {
            options: option_rows(Operation::ALL[0]),
            query: String::new(),
            answer: None,
            summary: None,
            translation: None,
            questions: None,
            error: None,
        }
    }

    /// View showing `result` in the slot for its operation.
    pub fn from_result(result: OperationResult) -> Self {
        let mut view = Self::empty().with_form(Some(result.operation()), None);
        match result {
            OperationResult::Answer(s) => view.answer = Some(s),
            OperationResult::Summary(s) => view.summary = Some(s),
            OperationResult::Translation(s) => view.translation = Some(s),
            questions @ OperationResult::Questions(_) => {
                view.questions = Some(questions.to_string())
            }
        }
        view
    }

    /// View showing the user-facing message of `err`.
    pub fn from_error(err: &PdfDeskError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::empty()
        }
    }

    /// Pre-fill the form with what the user submitted.
    pub fn with_form(mut self, operation: Option<Operation>, query: Option<&str>) -> Self {
        if let Some(op) = operation {
            self.options = option_rows(op);
        }
        if let Some(q) = query {
            self.query = q.to_string();
        }
        self
    }

    /// Render to an HTML string.
    pub fn render_html(&self) -> String {
        self.render().unwrap_or_else(|e| {
            warn!("Template rendering failed: {}", e);
            format!(
                "<!DOCTYPE html><p>Could not render page: {}</p>",
                escape_text(&e.to_string())
            )
        })
    }
}

impl Default for DeskView {
    fn default() -> Self {
        Self::empty()
    }
}

fn option_rows(selected: Operation) -> Vec<OptionRow> {
    Operation::ALL
        .into_iter()
        .map(|op| OptionRow {
            value: op.form_value(),
            selected: op == selected,
        })
        .collect()
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
