//! Mind AI centralized constants.
//! Magic numbers, strings, and limits live here.

// ─── Application ──────────────────────────────────────────────────────────────

pub mod app {
    pub const APP_NAME: &str = "Mind AI Study Helper";
    pub const SITE_URL: &str = "https://mind-ai.local";
}

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_GATEWAY_MODEL: &str = "google/gemini-2.0-flash-exp:free";
    pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
    pub const DEFAULT_CHATGPT_MODEL: &str = "gpt-4";
    pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-opus-20240229";
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";
    pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";
}

// ─── Chat Defaults ────────────────────────────────────────────────────────────

pub mod chat {
    /// Prior messages sent with every request.
    pub const WINDOW_SIZE: usize = 10;
    /// Messages re-rendered when history is restored.
    pub const RESTORE_LIMIT: usize = 50;
    pub const TEMPERATURE: f32 = 0.3;
    pub const MAX_TOKENS: u32 = 4000;
    /// Claude rejects requests without `max_tokens`.
    pub const CLAUDE_FALLBACK_MAX_TOKENS: u32 = 1000;
    pub const DEFAULT_INSTRUCTION: &str = "analyze this image/file in detail";
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
}

// ─── Routing ──────────────────────────────────────────────────────────────────

pub mod routing {
    pub const CODE_KEYWORDS: &[&str] = &["كود", "برمجة", "برمج"];
    pub const CREATIVE_KEYWORDS: &[&str] = &["إبداع", "قصه", "قصة"];
    pub const SHORT_PROMPT_CHARS: usize = 100;
}

// ─── File Directives ──────────────────────────────────────────────────────────

pub mod directives {
    pub const START_MARKER: &str = "$$FILE_GENERATION$$";
    pub const END_MARKER: &str = "$$END_FILE$$";
}

// ─── Storage ──────────────────────────────────────────────────────────────────

pub mod storage {
    pub const HISTORY_KEY_SUFFIX: &str = "_history";
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "mindai";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const DATA_DIR: &str = "mindai";
}

// ─── Server ───────────────────────────────────────────────────────────────────

pub mod server {
    pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
}
