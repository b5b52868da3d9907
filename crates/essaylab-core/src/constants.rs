/// EssayLab — centralized constants.
/// Limits, defaults and markup vocabulary shared across modules.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
    pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-5-20250929";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";
    pub const CLAUDE_API_VERSION: &str = "2023-06-01";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const MAX_TOKENS: u32 = 4096;
    pub const TEMPERATURE: f32 = 0.4;
    pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
    pub const CLAUDE_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
    pub const PLACEHOLDER: &str = "Start writing your essay...";
    pub const ESSAY_TYPE: &str = "Personal Statement";
    pub const COLLEGE_TARGET: &str = "Common App";
}

// ─── Advisory Limits ──────────────────────────────────────────────────────────

pub mod advisory {
    /// Client-side ceiling on a single advisory call.
    pub const TIMEOUT_SECS: u64 = 30;
    /// Essay text beyond this many characters is not sent to the model.
    pub const MAX_ESSAY_CHARS: usize = 3000;
    pub const MIN_SUGGESTIONS: usize = 3;
    pub const MAX_SUGGESTIONS: usize = 5;
}

// ─── Markup ───────────────────────────────────────────────────────────────────

pub mod markup {
    /// Tags a document may contain. Everything else is unwrapped on paste.
    pub const ALLOWED_TAGS: &[&str] = &[
        "p",
        "br",
        "strong",
        "em",
        "b",
        "i",
        "u",
        "ul",
        "ol",
        "li",
        "blockquote",
        "h1",
        "h2",
        "h3",
        "h4",
        "div",
        "span",
    ];

    /// Elements whose content is dropped together with the element.
    pub const DISCARDED_CONTENT_TAGS: &[&str] = &[
        "script", "style", "template", "iframe", "object", "noscript", "textarea", "title",
    ];

    /// Elements that break words apart when tags are stripped.
    pub const BLOCK_TAGS: &[&str] = &[
        "p",
        "br",
        "li",
        "ul",
        "ol",
        "div",
        "blockquote",
        "h1",
        "h2",
        "h3",
        "h4",
    ];

    pub const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "essaylab";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const ESSAYS_DIR: &str = "essays";
}
