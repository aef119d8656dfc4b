use crate::line_index::LineIndex;

/// One version of an open document.
///
/// Snapshots are never edited: every change notification produces a new
/// `Document`, and the boundary keeps whichever has the highest version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier the editor uses for the document.
    pub uri: String,
    /// Editor-assigned version, increasing with every change.
    pub version: i32,
    /// Full text of this version.
    pub text: String,
}

impl Document {
    /// Create a snapshot.
    pub fn new(uri: impl Into<String>, version: i32, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            version,
            text: text.into(),
        }
    }

    /// Index the text for position conversions.
    pub fn line_index(&self) -> LineIndex<'_> {
        LineIndex::new(&self.text)
    }

    /// Whether this snapshot should replace `other`. Equal versions replace,
    /// so a re-sent open wins over the stored copy.
    pub fn supersedes(&self, other: &Document) -> bool {
        self.version >= other.version
    }

    /// File extension of the URI, lowercased, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.uri.rsplit('/').next()?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext.to_lowercase())
    }
}
