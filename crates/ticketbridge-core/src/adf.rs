// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed model of the Atlassian Document Format (ADF).
//!
//! Only the node types the bridge reads or writes are modelled. Anything else
//! deserializes to [`AdfNode::Unsupported`] so foreign content in an issue
//! description never fails a parse.

use serde::{Deserialize, Serialize};

/// Root `doc` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "doc")]
pub struct AdfDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub content: Vec<AdfNode>,
}

fn default_version() -> u32 {
    1
}

impl Default for AdfDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl AdfDocument {
    pub fn new(content: Vec<AdfNode>) -> Self {
        Self {
            version: default_version(),
            content,
        }
    }

    /// One paragraph, lines separated by hard breaks.
    pub fn from_plain_text(text: &str) -> Self {
        let mut inline = Vec::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                inline.push(AdfNode::HardBreak);
            }
            if !line.is_empty() {
                inline.push(AdfNode::text(line));
            }
        }
        Self::new(vec![AdfNode::Paragraph { content: inline }])
    }

    /// Concatenated text of all blocks, one line per block.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(AdfNode::plain_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelAttrs {
    pub panel_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttrs {
    pub href: String,
}

/// Inline formatting applied to a text node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Strong,
    Em,
    Code,
    Link { attrs: LinkAttrs },
    #[serde(other)]
    Other,
}

/// A block or inline ADF node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AdfNode {
    Heading {
        attrs: HeadingAttrs,
        #[serde(default)]
        content: Vec<AdfNode>,
    },
    Paragraph {
        #[serde(default)]
        content: Vec<AdfNode>,
    },
    Table {
        #[serde(default)]
        content: Vec<AdfNode>,
    },
    TableRow {
        #[serde(default)]
        content: Vec<AdfNode>,
    },
    TableHeader {
        #[serde(default)]
        content: Vec<AdfNode>,
    },
    TableCell {
        #[serde(default)]
        content: Vec<AdfNode>,
    },
    Panel {
        attrs: PanelAttrs,
        #[serde(default)]
        content: Vec<AdfNode>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    HardBreak,
    #[serde(other)]
    Unsupported,
}

impl AdfNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self::Text {
            text: text.into(),
            marks,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            content: vec![Self::text(text)],
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            attrs: HeadingAttrs { level },
            content: vec![Self::text(text)],
        }
    }

    pub fn panel(panel_type: impl Into<String>, content: Vec<AdfNode>) -> Self {
        Self::Panel {
            attrs: PanelAttrs {
                panel_type: panel_type.into(),
            },
            content,
        }
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[AdfNode] {
        match self {
            Self::Heading { content, .. }
            | Self::Paragraph { content }
            | Self::Table { content }
            | Self::TableRow { content }
            | Self::TableHeader { content }
            | Self::TableCell { content }
            | Self::Panel { content, .. } => content,
            Self::Text { .. } | Self::HardBreak | Self::Unsupported => &[],
        }
    }

    /// Text content of this node and its descendants.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Text { text, .. } => text.clone(),
            Self::HardBreak => "\n".to_string(),
            Self::Paragraph { content } | Self::Heading { content, .. } => {
                content.iter().map(Self::plain_text).collect()
            }
            other => other
                .children()
                .iter()
                .map(Self::plain_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
