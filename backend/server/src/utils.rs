use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::AppError::{self, MalformedPayload},
    models::TodoUpdate,
};

static CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Cc}").expect("control character pattern"));
static CONTROL_KEEP_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\P{Cc}\n\t]").expect("control character pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

pub fn sanitize_title(input: &str) -> String {
    let s = WHITESPACE.replace_all(input, " ");
    let s = CONTROL.replace_all(&s, "");

    s.trim().to_string()
}

pub fn sanitize_description(input: &str) -> String {
    let s = input.replace("\r\n", "\n");

    CONTROL_KEEP_LINES.replace_all(&s, "").trim().to_string()
}

/// Sanitized, non-blank title or a 400.
pub fn require_title(input: &str) -> Result<String, AppError> {
    let title = sanitize_title(input);

    if title.is_empty() {
        return Err(MalformedPayload("title must not be empty".to_string()));
    }

    Ok(title)
}

pub fn clean_update(update: TodoUpdate) -> Result<TodoUpdate, AppError> {
    Ok(TodoUpdate {
        title: update.title.as_deref().map(require_title).transpose()?,
        description: update.description.as_deref().map(sanitize_description),
        completed: update.completed,
    })
}
