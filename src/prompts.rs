//! Prompt templates.
//!
//! The question-generation prompt is fed to a plain causal generator on
//! every backend. The `*_SYSTEM_PROMPT` constants are only used by the LLM
//! backend, which has to be told in words what a task-specific model does
//! implicitly.

/// Build the question-generation prompt for one chunk.
pub fn question_prompt(chunk: &str) -> String {
    format!("Based on the following text, generate meaningful questions:\n\n{chunk}\n\nQuestions:")
}

/// Whitespace-separated word count, as used for the generation length budget.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// System prompt for extractive question answering.
pub const ANSWER_SYSTEM_PROMPT: &str = r#"You answer questions about a document.

Rules:
- Answer with the shortest span of the document that answers the question.
- Copy the span verbatim; do not paraphrase or explain.
- If the document does not contain the answer, reply with an empty line.
- Output ONLY the answer."#;

/// System prompt for abstractive summarization.
///
/// `{min}` and `{max}` are replaced with the word bounds.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You write abstractive summaries of documents.

Rules:
- Write between {min} and {max} words.
- Keep only the central facts; no opinions, no preamble.
- Output ONLY the summary as plain prose."#;

/// System prompt for translation.
///
/// `{target}` is replaced with the target language.
pub const TRANSLATION_SYSTEM_PROMPT: &str = r#"You are a professional translator.

Translate the user's text from English into {target}.
- Translate everything; do not summarise or skip content.
- Keep numbers, names and punctuation.
- Output ONLY the translation."#;

/// System prompt for free-running text continuation.
pub const CONTINUATION_SYSTEM_PROMPT: &str = r#"Continue the user's text naturally.
Output ONLY the continuation, one item per line, without repeating the text you were given."#;

/// Target language of the default translation model (English → Urdu).
pub const DEFAULT_TRANSLATION_TARGET: &str = "Urdu";

/// Fill the summary bounds into [`SUMMARY_SYSTEM_PROMPT`].
pub fn summary_system_prompt(min: usize, max: usize) -> String {
    SUMMARY_SYSTEM_PROMPT
        .replace("{min}", &min.to_string())
        .replace("{max}", &max.to_string())
}

/// Fill the target language into [`TRANSLATION_SYSTEM_PROMPT`].
pub fn translation_system_prompt(target: &str) -> String {
    TRANSLATION_SYSTEM_PROMPT.replace("{target}", target)
}

/// User message for question answering.
pub fn answer_user_message(question: &str, context: &str) -> String {
    format!("Document:\n\"\"\"{context}\"\"\"\n\nQuestion: {question}")
}
