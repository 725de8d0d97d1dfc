use crate::directive::{self, placeholder_regex, FileDescriptor};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// What a front end renders for one chat message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageBody {
    /// Message text; assistant text carries download placeholders.
    pub text: String,
    pub files: Vec<FileDescriptor>,
}

impl MessageBody {
    /// A body with no downloads (user and error messages).
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
        }
    }

    /// Parse raw model output, pulling file directives out of it.
    pub fn from_reply(raw: &str) -> Self {
        let parsed = directive::extract(raw);
        Self {
            text: parsed.cleaned_text,
            files: parsed.files,
        }
    }

    pub fn file(&self, index: usize) -> Option<&FileDescriptor> {
        self.files.get(index)
    }

    /// HTML rendition with basic formatting and download buttons.
    pub fn to_html(&self) -> String {
        let escaped = escape_html(&self.text);

        let mut html = String::with_capacity(escaped.len());
        let mut last = 0;
        for caps in fence_regex().captures_iter(&escaped) {
            let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            html.push_str(&format_inline(&escaped[last..whole.start()]));
            html.push_str("<pre><code>");
            html.push_str(code.as_str().trim_start_matches('\n'));
            html.push_str("</code></pre>");
            last = whole.end();
        }
        html.push_str(&format_inline(&escaped[last..]));

        self.swap_placeholders(&html, |index, file| {
            format!(
                "<button class=\"download-btn\" data-file-index=\"{}\">{}</button>",
                index,
                escape_html(&file.download_name())
            )
        })
    }

    /// Terminal rendition: placeholders become `[download N: name]`, 1-based.
    pub fn to_plain(&self) -> String {
        self.swap_placeholders(&self.text, |index, file| {
            format!("[download {}: {}]", index + 1, file.download_name())
        })
    }

    fn swap_placeholders(
        &self,
        text: &str,
        render: impl Fn(usize, &FileDescriptor) -> String,
    ) -> String {
        placeholder_regex()
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.files.get(i).map(|f| render(i, f)))
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(.*?)```").expect("fence pattern is valid"))
}

fn bold_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"))
}

fn inline_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`\n]+)`").expect("inline code pattern is valid"))
}

// Outside fenced blocks only.
fn format_inline(text: &str) -> String {
    let text = bold_regex().replace_all(text, "<strong>$1</strong>");
    let text = inline_code_regex().replace_all(&text, "<code>$1</code>");
    text.replace('\n', "<br>")
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
