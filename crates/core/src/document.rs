use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the business document a signature session is collecting a
/// signature for.
///
/// Invoices are the primary document kind; other kinds carry an explicit
/// `kind` discriminator so artifact generation can dispatch exhaustively
/// instead of matching on free-form strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentRef {
    /// An invoice, identified by its record id.
    Invoice {
        /// Invoice record identifier.
        id: String,
    },
    /// Any other document kind (e.g. delivery note, work order).
    Other {
        /// Document kind discriminator.
        kind: String,
        /// Document record identifier.
        id: String,
    },
}

impl DocumentRef {
    /// Reference an invoice by id.
    #[must_use]
    pub fn invoice(id: impl Into<String>) -> Self {
        Self::Invoice { id: id.into() }
    }

    /// Reference a non-invoice document by kind and id.
    #[must_use]
    pub fn other(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Other {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// The document kind discriminator.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Invoice { .. } => "invoice",
            Self::Other { kind, .. } => kind,
        }
    }

    /// The document record identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Invoice { id } | Self::Other { id, .. } => id,
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_ref() {
        let doc = DocumentRef::invoice("inv-2024-001");
        assert_eq!(doc.kind(), "invoice");
        assert_eq!(doc.id(), "inv-2024-001");
        assert_eq!(doc.to_string(), "invoice:inv-2024-001");
    }

    #[test]
    fn other_ref() {
        let doc = DocumentRef::other("delivery_note", "dn-77");
        assert_eq!(doc.kind(), "delivery_note");
        assert_eq!(doc.id(), "dn-77");
    }

    #[test]
    fn refs_compare_by_kind_and_id() {
        assert_eq!(DocumentRef::invoice("a"), DocumentRef::invoice("a"));
        assert_ne!(DocumentRef::invoice("a"), DocumentRef::invoice("b"));
        assert_ne!(
            DocumentRef::invoice("a"),
            DocumentRef::other("invoice", "a")
        );
    }

    #[test]
    fn serde_tags_the_kind() {
        let doc = DocumentRef::invoice("inv-1");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "invoice");
        assert_eq!(json["id"], "inv-1");

        let back: DocumentRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
