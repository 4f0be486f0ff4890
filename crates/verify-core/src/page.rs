//! In-memory page for running the engine without a browser
//!
//! A page is a list of blocks (one per element), each holding text and
//! marker nodes. Script and style blocks are never scanned.

use crate::detail::DetailView;
use crate::error::VerifyError;
use crate::render::{Piece, Renderer};
use crate::status::Status;
use crate::summary::Summary;

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryNode {
    Text {
        node: u64,
        text: String,
    },
    Marker {
        node: u64,
        marker_id: usize,
        value: String,
        status: Status,
    },
}

impl MemoryNode {
    fn node(&self) -> u64 {
        match self {
            MemoryNode::Text { node, .. } | MemoryNode::Marker { node, .. } => *node,
        }
    }

    fn text(&self) -> &str {
        match self {
            MemoryNode::Text { text, .. } => text,
            MemoryNode::Marker { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub tag: String,
    pub nodes: Vec<MemoryNode>,
}

/// Marker as seen from outside the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerView {
    pub node: u64,
    pub marker_id: usize,
    pub value: String,
    pub status: Status,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    blocks: Vec<Block>,
    next_node: u64,
    summary: Option<Summary>,
    detail: Option<DetailView>,
    enabled: bool,
    status_writes: usize,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Append an element holding a single text node
    pub fn with_block(mut self, tag: &str, text: &str) -> Self {
        let node = self.alloc();
        self.blocks.push(Block {
            tag: tag.to_ascii_lowercase(),
            nodes: vec![MemoryNode::Text {
                node,
                text: text.to_string(),
            }],
        });
        self
    }

    /// Page text with markers shown as their values, one line per block
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.nodes.iter().map(MemoryNode::text).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn markers(&self) -> Vec<MarkerView> {
        self.blocks
            .iter()
            .flat_map(|b| b.nodes.iter())
            .filter_map(|n| match n {
                MemoryNode::Marker {
                    node,
                    marker_id,
                    value,
                    status,
                } => Some(MarkerView {
                    node: *node,
                    marker_id: *marker_id,
                    value: value.clone(),
                    status: *status,
                }),
                MemoryNode::Text { .. } => None,
            })
            .collect()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of status updates applied to markers so far
    pub fn status_writes(&self) -> usize {
        self.status_writes
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn alloc(&mut self) -> u64 {
        self.next_node += 1;
        self.next_node
    }

    fn find(&self, node: u64) -> Option<(usize, usize)> {
        self.blocks.iter().enumerate().find_map(|(b, block)| {
            block
                .nodes
                .iter()
                .position(|n| n.node() == node)
                .map(|i| (b, i))
        })
    }
}

impl Renderer for MemoryPage {
    type Text = u64;
    type Marker = u64;

    fn text_nodes(&mut self) -> Vec<u64> {
        self.blocks
            .iter()
            .filter(|b| !SKIPPED_TAGS.contains(&b.tag.as_str()))
            .flat_map(|b| b.nodes.iter())
            .filter_map(|n| match n {
                MemoryNode::Text { node, text } if !text.trim().is_empty() => Some(*node),
                _ => None,
            })
            .collect()
    }

    fn text_of(&self, node: &u64) -> String {
        self.find(*node)
            .map(|(b, i)| self.blocks[b].nodes[i].text().to_string())
            .unwrap_or_default()
    }

    fn replace_text(&mut self, node: &u64, pieces: &[Piece<'_>]) -> Result<Vec<u64>, VerifyError> {
        let (b, i) = self
            .find(*node)
            .ok_or_else(|| VerifyError::Render(format!("text node {} is gone", node)))?;

        let mut replacement = Vec::with_capacity(pieces.len());
        let mut markers = Vec::new();
        for piece in pieces {
            let node = self.alloc();
            match piece {
                Piece::Text(text) => replacement.push(MemoryNode::Text {
                    node,
                    text: text.to_string(),
                }),
                Piece::Marker(spec) => {
                    replacement.push(MemoryNode::Marker {
                        node,
                        marker_id: spec.id,
                        value: spec.value.to_string(),
                        status: spec.status,
                    });
                    markers.push(node);
                }
            }
        }

        self.blocks[b].nodes.splice(i..=i, replacement);
        Ok(markers)
    }

    fn set_marker_status(&mut self, marker: &u64, new_status: Status) -> Result<(), VerifyError> {
        let (b, i) = self
            .find(*marker)
            .ok_or_else(|| VerifyError::Render(format!("marker {} is gone", marker)))?;
        match &mut self.blocks[b].nodes[i] {
            MemoryNode::Marker { status, .. } => {
                *status = new_status;
                self.status_writes += 1;
                Ok(())
            }
            MemoryNode::Text { .. } => Err(VerifyError::Render(format!(
                "node {} is not a marker",
                marker
            ))),
        }
    }

    fn render_summary(&mut self, summary: &Summary, _enabled: bool) -> Result<(), VerifyError> {
        self.summary = Some(*summary);
        Ok(())
    }

    fn show_detail(&mut self, view: &DetailView, _anchor: &u64) -> Result<(), VerifyError> {
        self.detail = Some(view.clone());
        Ok(())
    }

    fn hide_detail(&mut self) {
        self.detail = None;
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), VerifyError> {
        self.enabled = enabled;
        Ok(())
    }

    fn unmount(&mut self, markers: &[u64]) {
        for marker in markers {
            if let Some((b, i)) = self.find(*marker) {
                let text = self.blocks[b].nodes[i].text().to_string();
                self.blocks[b].nodes[i] = MemoryNode::Text {
                    node: *marker,
                    text,
                };
            }
        }
        self.summary = None;
        self.detail = None;
    }
}
