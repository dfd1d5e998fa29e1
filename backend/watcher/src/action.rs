use std::fmt;
use std::str::FromStr;

use codeferry_browser::AffordanceKind;
use serde::Serialize;

use crate::chord::KeyChord;

/// The page's structure changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    KeyPress(KeyChord),
    Click(AffordanceId),
    ClipboardCopy(String),
}

/// Short handle for an attached affordance, stable while its element exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AffordanceId(pub u32);

impl fmt::Display for AffordanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AffordanceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(AffordanceId)
    }
}

/// One row of the watcher's published affordance table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedAffordance {
    pub id: AffordanceId,
    pub kind: AffordanceKind,
    pub label: String,
}
