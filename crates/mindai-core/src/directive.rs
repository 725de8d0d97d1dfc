//! File generation directives embedded in model output.
//!
//! A directive is a JSON object wrapped in `$$FILE_GENERATION$$` …
//! `$$END_FILE$$`. Directives are untrusted input: they are parsed, never
//! executed, and a directive that does not parse is dropped silently.

use crate::constants::directives;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A file the model asked the client to offer for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// File extension, e.g. `py` or `md`.
    #[serde(rename = "type")]
    pub file_type: String,
    pub title: String,
    pub content: String,
}

impl FileDescriptor {
    pub fn download_name(&self) -> String {
        download_name(&self.title, &self.file_type)
    }
}

/// `title.extension`, safe to use as a single path component.
pub fn download_name(title: &str, extension: &str) -> String {
    let clean = |s: &str| -> String {
        s.trim()
            .chars()
            .map(|c| {
                if c == '/' || c == '\\' || c.is_control() {
                    '_'
                } else {
                    c
                }
            })
            .collect()
    };
    let title = clean(title);
    let title = title.trim_start_matches('.');
    let title = if title.is_empty() { "file" } else { title };
    let extension = clean(extension);
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        title.to_string()
    } else {
        format!("{}.{}", title, extension)
    }
}

/// Model text with directives replaced by download placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    pub cleaned_text: String,
    pub files: Vec<FileDescriptor>,
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?s){}(.*?){}",
            regex::escape(directives::START_MARKER),
            regex::escape(directives::END_MARKER)
        );
        Regex::new(&pattern).expect("directive pattern is valid")
    })
}

// Placeholders are fenced with private-use code points; bracketed text in a
// reply is never a placeholder.
const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

pub(crate) fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\x{E000}download:(\d+)\x{E001}").expect("placeholder pattern is valid")
    })
}

/// Placeholder left where the directive for `files[index]` used to be.
pub fn placeholder(index: usize) -> String {
    format!("{}download:{}{}", PLACEHOLDER_OPEN, index, PLACEHOLDER_CLOSE)
}

/// Pull every directive out of `text`, left to right.
pub fn extract(text: &str) -> ParsedReply {
    let mut files = Vec::new();
    let cleaned_text = directive_regex()
        .replace_all(text, |caps: &regex::Captures| {
            match serde_json::from_str::<FileDescriptor>(caps[1].trim()) {
                Ok(file) => {
                    files.push(file);
                    placeholder(files.len() - 1)
                }
                Err(e) => {
                    tracing::debug!("Dropping malformed file directive: {}", e);
                    String::new()
                }
            }
        })
        .into_owned();

    ParsedReply {
        cleaned_text,
        files,
    }
}
