//! Actionable affordances attached to page elements.

use codeferry_core::CodeBlock;
use serde::Serialize;

use crate::element_query::ElementKey;

/// What activating an affordance sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffordanceAction {
    /// A copy button's resolved code, sent as plain text.
    CopyCode(String),
    /// A marked container's text, uploaded then converted.
    UploadContent(String),
    /// A single extracted block, sent as a one-block batch.
    SendBlock(CodeBlock),
}

impl AffordanceAction {
    pub fn kind(&self) -> AffordanceKind {
        match self {
            AffordanceAction::CopyCode(_) => AffordanceKind::CopyButton,
            AffordanceAction::UploadContent(_) => AffordanceKind::MarkedContainer,
            AffordanceAction::SendBlock(_) => AffordanceKind::SendButton,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AffordanceKind {
    CopyButton,
    MarkedContainer,
    SendButton,
}

impl AffordanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AffordanceKind::CopyButton => "copy_button",
            AffordanceKind::MarkedContainer => "marked_container",
            AffordanceKind::SendButton => "send_button",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordance {
    pub key: ElementKey,
    pub action: AffordanceAction,
}

impl Affordance {
    pub fn kind(&self) -> AffordanceKind {
        self.action.kind()
    }

    /// Short human label for listings.
    pub fn label(&self) -> String {
        match &self.action {
            AffordanceAction::CopyCode(code) => format!("copy: {}", first_line(code)),
            AffordanceAction::UploadContent(text) => format!("upload: {}", first_line(text)),
            AffordanceAction::SendBlock(block) => format!("send {block}"),
        }
    }
}

fn first_line(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut out: String = line.chars().take(40).collect();
    if line.chars().count() > 40 || text.lines().nth(1).is_some() {
        out.push_str("...");
    }
    out
}
