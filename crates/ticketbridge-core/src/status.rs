// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal-status vocabulary and issue-key matching.

use regex::Regex;

use crate::error::BridgeError;

/// Statuses treated as "resolved" when no vocabulary is configured.
pub const DEFAULT_TERMINAL_STATUSES: &[&str] = &[
    "done",
    "closed",
    "resolved",
    "complete",
    "completed",
    "готов",
    "готово",
    "закрыт",
    "решена",
    "выполнена",
    "отменено",
];

/// Case-insensitive set of tracker statuses that count as terminal.
#[derive(Debug, Clone)]
pub struct StatusVocabulary {
    terminal: Vec<String>,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_STATUSES.iter().copied())
    }
}

impl StatusVocabulary {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terminal: statuses
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_terminal(&self, status: &str) -> bool {
        let status = status.trim().to_lowercase();
        !status.is_empty() && self.terminal.iter().any(|t| *t == status)
    }
}

/// Finds issue keys of one tracker project in free text.
#[derive(Debug, Clone)]
pub struct IssueKeyMatcher {
    regex: Regex,
}

impl IssueKeyMatcher {
    /// Matches `PROJECT-123` on word boundaries, ignoring case.
    pub fn new(project_key: &str) -> Result<Self, BridgeError> {
        let pattern = format!(r"(?i)\b{}-\d+\b", regex::escape(project_key.trim()));
        let regex = Regex::new(&pattern)
            .map_err(|e| BridgeError::Config(format!("invalid project key pattern: {e}")))?;
        Ok(Self { regex })
    }

    /// First key in `text`, uppercased.
    pub fn find(&self, text: &str) -> Option<String> {
        self.regex.find(text).map(|m| m.as_str().to_uppercase())
    }
}
