//! In-memory model for open documents: rope-backed text with LSP version
//! gating. Change batches older than the current version are rejected so
//! published diagnostics always describe the newest text.

use ropey::Rope;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};
use tracing::error;

/// Converts an LSP position to a character offset in the rope. `None` when
/// the position lies outside the text.
pub fn position_to_char_offset(position: &Position, text: &Rope) -> Option<usize> {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return None;
    }
    let offset = text.line_to_char(line) + position.character as usize;
    if offset > text.len_chars() {
        return None;
    }
    Some(offset)
}

/// Mutable document state behind the lock.
#[derive(Debug)]
pub struct DocumentState {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
}

impl DocumentState {
    /// Applies a batch of content changes, either incremental range edits
    /// or full-text replacements. Fails without touching the text when the
    /// version is stale or a range does not fit the current text.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<(), String> {
        if version <= self.version {
            return Err(format!(
                "version {} is not newer than {}",
                version, self.version
            ));
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_char_offset(&range.start, &self.text)
                    .ok_or_else(|| format!("change start {:?} is outside the document", range.start))?;
                let end = position_to_char_offset(&range.end, &self.text)
                    .ok_or_else(|| format!("change end {:?} is outside the document", range.end))?;
                if start > end {
                    return Err(format!("inverted change range {:?}", range));
                }
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
        Ok(())
    }
}

/// One open document: a process-unique id used for log correlation plus the
/// versioned text state.
#[derive(Debug)]
pub struct LspDocument {
    pub id: u32,
    pub state: RwLock<DocumentState>,
}

impl LspDocument {
    pub fn new(id: u32, uri: Url, text: &str, version: i32) -> Self {
        LspDocument {
            id,
            state: RwLock::new(DocumentState {
                uri,
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies `changes` and returns the updated text, or `None` when the
    /// batch was rejected (stale version or malformed range).
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Option<String> {
        let mut state = self.state.write().await;
        match state.apply(changes, version) {
            Ok(()) => Some(state.text.to_string()),
            Err(message) => {
                error!(
                    "Failed to apply changes to document {}: {}",
                    state.uri, message
                );
                None
            }
        }
    }

    /// Snapshot of the text together with the character offset for
    /// `position`, taken under one lock so the two cannot drift apart.
    pub async fn text_with_offset(&self, position: Position) -> Option<(String, usize)> {
        let state = self.state.read().await;
        let offset = position_to_char_offset(&position, &state.text)?;
        Some((state.text.to_string(), offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_lsp::lsp_types::Range;

    fn create_test_document(uri: &str, text: &str) -> Arc<LspDocument> {
        Arc::new(LspDocument::new(1, Url::parse(uri).unwrap(), text, 0))
    }

    fn range_change(range: Range, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(range),
            range_length: None,
            text: text.to_string(),
        }
    }

    fn full_change(text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn apply_full_change_replaces_the_text() {
        let doc = create_test_document("file:///test.dana", "initial text");
        let result = doc.apply(vec![full_change("new text")], 1).await;
        assert_eq!(result.as_deref(), Some("new text"));
        assert_eq!(doc.version().await, 1);
    }

    #[tokio::test]
    async fn apply_incremental_change_edits_a_range() {
        let doc = create_test_document("file:///test.dana", "hello world");
        let change = range_change(
            Range {
                start: Position { line: 0, character: 6 },
                end: Position { line: 0, character: 11 },
            },
            "there",
        );
        let result = doc.apply(vec![change], 1).await;
        assert_eq!(result.as_deref(), Some("hello there"));
    }

    #[tokio::test]
    async fn apply_runs_batched_changes_in_order() {
        let doc = create_test_document("file:///test.dana", "var x is int\n");
        let changes = vec![
            range_change(
                Range {
                    start: Position { line: 0, character: 4 },
                    end: Position { line: 0, character: 5 },
                },
                "count",
            ),
            range_change(
                Range {
                    start: Position { line: 1, character: 0 },
                    end: Position { line: 1, character: 0 },
                },
                "count = 0\n",
            ),
        ];
        let result = doc.apply(changes, 1).await;
        assert_eq!(result.as_deref(), Some("var count is int\ncount = 0\n"));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let doc = create_test_document("file:///test.dana", "initial text");
        assert!(doc.apply(vec![full_change("newer")], 2).await.is_some());

        let result = doc.apply(vec![full_change("older")], 1).await;
        assert!(result.is_none());
        assert_eq!(doc.text().await, "newer");
        assert_eq!(doc.version().await, 2);
    }

    #[tokio::test]
    async fn out_of_range_change_is_rejected() {
        let doc = create_test_document("file:///test.dana", "short");
        let change = range_change(
            Range {
                start: Position { line: 3, character: 0 },
                end: Position { line: 3, character: 1 },
            },
            "x",
        );
        assert!(doc.apply(vec![change], 1).await.is_none());
        assert_eq!(doc.text().await, "short");
        assert_eq!(doc.version().await, 0);
    }

    #[tokio::test]
    async fn text_with_offset_resolves_positions() {
        let doc = create_test_document("file:///test.dana", "if x:\n    skip\n");
        let (text, offset) = doc
            .text_with_offset(Position { line: 1, character: 4 })
            .await
            .unwrap();
        assert_eq!(offset, 10);
        assert_eq!(&text[offset..offset + 4], "skip");

        let out_of_bounds = doc
            .text_with_offset(Position { line: 9, character: 0 })
            .await;
        assert!(out_of_bounds.is_none());
    }
}
