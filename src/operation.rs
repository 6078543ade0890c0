//! The four operations a user can pick in the upload form.

use crate::error::PdfDeskError;
use std::fmt;
use std::str::FromStr;

/// Operation selected through the `option` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Extractive question answering over the whole document.
    QuestionAnswering,
    /// Abstractive summary of the whole document.
    Summarize,
    /// Chunked translation of the whole document.
    Translate,
    /// Chunked question generation with de-duplication.
    GenerateQuestions,
}

impl Operation {
    /// Every operation, in form order.
    pub const ALL: [Operation; 4] = [
        Operation::QuestionAnswering,
        Operation::Summarize,
        Operation::Translate,
        Operation::GenerateQuestions,
    ];

    /// The exact string submitted by the form for this operation.
    pub const fn form_value(self) -> &'static str {
        match self {
            Operation::QuestionAnswering => "Question and Answer",
            Operation::Summarize => "Summarize PDF",
            Operation::Translate => "Translate PDF",
            Operation::GenerateQuestions => "Generate Questions",
        }
    }

    pub const fn form_values() -> [&'static str; 4] {
        [
            Operation::QuestionAnswering.form_value(),
            Operation::Summarize.form_value(),
            Operation::Translate.form_value(),
            Operation::GenerateQuestions.form_value(),
        ]
    }

    /// Noun used in user-facing error messages ("… during translation").
    pub const fn activity(self) -> &'static str {
        match self {
            Operation::QuestionAnswering => "question answering",
            Operation::Summarize => "summarization",
            Operation::Translate => "translation",
            Operation::GenerateQuestions => "question generation",
        }
    }

    /// Whether the operation needs the `user_query` field.
    pub const fn needs_query(self) -> bool {
        matches!(self, Operation::QuestionAnswering)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_value())
    }
}

impl FromStr for Operation {
    type Err = PdfDeskError;

    /// Parses the form value. Surrounding whitespace is ignored; the match is
    /// otherwise exact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Operation::ALL
            .into_iter()
            .find(|op| op.form_value() == trimmed)
            .ok_or_else(|| PdfDeskError::UnknownOperation {
                value: trimmed.to_string(),
            })
    }
}
