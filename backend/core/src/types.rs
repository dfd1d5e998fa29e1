use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform name used when no registered host matches.
pub const GENERIC_PLATFORM: &str = "generic";

/// Language tag used when the classifier finds nothing.
pub const DEFAULT_LANGUAGE: &str = "text";

const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Strip zero-width spaces and surrounding whitespace from extracted text.
pub fn normalize_code(raw: &str) -> String {
    raw.replace(ZERO_WIDTH_SPACE, "").trim().to_string()
}

/// Where a code block was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockProvenance {
    pub platform: String,
    pub source_url: String,
    pub page_title: String,
    pub captured_at: DateTime<Utc>,
}

/// One extracted snippet of source code plus provenance metadata.
///
/// Fields are private: a block can only be built through [`CodeBlock::new`],
/// which refuses empty or too-short code, and is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCodeBlock")]
pub struct CodeBlock {
    code: String,
    language: String,
    platform: String,
    source_url: String,
    page_title: String,
    captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context_html: Option<String>,
}

impl CodeBlock {
    /// Build a block from raw element text. Returns `None` when the normalized
    /// text has fewer than `min_length` characters (or is empty).
    pub fn new(
        raw_text: &str,
        min_length: usize,
        language: impl Into<String>,
        provenance: BlockProvenance,
        context_html: Option<String>,
    ) -> Option<Self> {
        let code = normalize_code(raw_text);
        if code.is_empty() || code.chars().count() < min_length {
            return None;
        }
        Some(Self {
            code,
            language: language.into().to_lowercase(),
            platform: provenance.platform,
            source_url: provenance.source_url,
            page_title: provenance.page_title,
            captured_at: provenance.captured_at,
            context_html,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn page_title(&self) -> &str {
        &self.page_title
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn context_html(&self) -> Option<&str> {
        self.context_html.as_deref()
    }

    /// First `max_chars` characters of the code, for log lines.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.code.chars().take(max_chars).collect();
        if self.code.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }

    /// Flatten into the `/code-blocks` wire shape.
    pub fn to_wire(&self) -> WireBlock {
        WireBlock {
            code: self.code.clone(),
            language: self.language.clone(),
            platform: self.platform.clone(),
            url: self.source_url.clone(),
            timestamp: self.captured_at,
            title: self.page_title.clone(),
        }
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {} chars",
            self.platform,
            self.language,
            self.code.chars().count()
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCodeBlock {
    code: String,
    language: String,
    platform: String,
    source_url: String,
    page_title: String,
    captured_at: DateTime<Utc>,
    #[serde(default)]
    context_html: Option<String>,
}

impl TryFrom<RawCodeBlock> for CodeBlock {
    type Error = String;

    fn try_from(raw: RawCodeBlock) -> Result<Self, Self::Error> {
        let provenance = BlockProvenance {
            platform: raw.platform,
            source_url: raw.source_url,
            page_title: raw.page_title,
            captured_at: raw.captured_at,
        };
        CodeBlock::new(&raw.code, 1, raw.language, provenance, raw.context_html)
            .ok_or_else(|| "code block must not be empty".to_string())
    }
}

/// Page-level metadata sent alongside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
}

/// A batch of blocks from one scan, with the page they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPayload {
    pub blocks: Vec<CodeBlock>,
    pub metadata: PageMetadata,
}

impl BatchPayload {
    pub fn new(blocks: Vec<CodeBlock>, metadata: PageMetadata) -> Self {
        Self { blocks, metadata }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

/// Element of the `/code-blocks` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBlock {
    pub code: String,
    pub language: String,
    pub platform: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
}

/// How a delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Success,
    /// The service answered with an `error` field.
    Rejected,
    /// Retries or the deadline ran out.
    Exhausted,
}

/// One delivery from first request to terminal outcome. Logged, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: u64,
    pub kind: String,
    /// Requests sent, retries included.
    pub attempts: u32,
    pub outcome: DeliveryOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provenance() -> BlockProvenance {
        BlockProvenance {
            platform: "github".into(),
            source_url: "https://github.com/a/b".into(),
            page_title: "a/b".into(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn strips_zero_width_spaces_and_whitespace() {
        assert_eq!(normalize_code("  \u{200B}let x\u{200B} = 1;\n "), "let x = 1;");
    }

    #[test]
    fn rejects_short_code() {
        assert!(CodeBlock::new(" a ", 2, "text", provenance(), None).is_none());
        assert!(CodeBlock::new("\u{200B}\u{200B}", 1, "text", provenance(), None).is_none());
        assert!(CodeBlock::new("ab", 2, "text", provenance(), None).is_some());
    }

    #[test]
    fn min_length_counts_chars_not_bytes() {
        assert!(CodeBlock::new("é", 2, "text", provenance(), None).is_none());
        assert!(CodeBlock::new("éé", 2, "text", provenance(), None).is_some());
    }

    #[test]
    fn language_is_lowercased() {
        let block = CodeBlock::new("print(1)", 2, "Python", provenance(), None).unwrap();
        assert_eq!(block.language(), "python");
    }

    #[test]
    fn serializes_camel_case_and_rejects_empty_on_read() {
        let block = CodeBlock::new("x=1", 2, "text", provenance(), None).unwrap();
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["sourceUrl"], "https://github.com/a/b");
        assert!(json.get("contextHtml").is_none());

        let back: CodeBlock = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, block);

        let mut empty = json;
        empty["code"] = serde_json::Value::String("   ".into());
        assert!(serde_json::from_value::<CodeBlock>(empty).is_err());
    }

    #[test]
    fn preview_truncates() {
        let block = CodeBlock::new("abcdef", 2, "text", provenance(), None).unwrap();
        assert_eq!(block.preview(3), "abc...");
        assert_eq!(block.preview(10), "abcdef");
    }

    #[test]
    fn wire_block_copies_provenance() {
        let block = CodeBlock::new("x=1", 2, "text", provenance(), None).unwrap();
        let wire = block.to_wire();
        assert_eq!(wire.url, "https://github.com/a/b");
        assert_eq!(wire.title, "a/b");
        assert_eq!(wire.platform, "github");
    }
}
