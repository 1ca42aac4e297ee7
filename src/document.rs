//! Minimal document abstraction the resolver and save logic run against: a
//! tree of nodes with an optional reference key and an optional ordered child
//! list. The core is independent of any particular editor framework; an
//! embedder implements [ReferenceNode] for its own node type, or uses the
//! bundled [Block] directly.

use serde::{Deserialize, Serialize};

use crate::key::RefKey;

/// Integer path into the document tree, addressing an insertion point.
/// Interpretation belongs to the editing collaborator.
pub type Location = Vec<usize>;

/// A document node as seen by the resolver.
///
/// For resolution purposes a node that carries a reference key is a leaf:
/// its children are decorative text slots, never nested attachments, and the
/// resolver does not descend into them even when both a key and children are
/// present.
pub trait ReferenceNode: Clone {
    /// The reference key carried by this node, if any.
    fn reference(&self) -> Option<&RefKey>;

    /// Ordered child list. Empty for leaves.
    fn children(&self) -> &[Self];

    /// Structural copy of this node with its reference key replaced.
    fn with_reference(&self, key: RefKey) -> Self;

    /// Structural copy of this node with its child list replaced.
    fn with_children(&self, children: Vec<Self>) -> Self;
}

/// Ready-made [ReferenceNode] implementation: a plain serde-able tree node.
/// Used by the tests and by embedders that do not bring their own document
/// model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<RefKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Block {
    /// Leaf text node without a reference.
    pub fn text(text: impl Into<String>) -> Block {
        Block {
            text: text.into(),
            ..Block::default()
        }
    }

    /// Attachment node referencing `key`.
    pub fn attachment(key: RefKey) -> Block {
        Block {
            reference: Some(key),
            ..Block::default()
        }
    }

    /// Container node holding `children`.
    pub fn group(children: Vec<Block>) -> Block {
        Block {
            children,
            ..Block::default()
        }
    }
}

impl ReferenceNode for Block {
    fn reference(&self) -> Option<&RefKey> {
        self.reference.as_ref()
    }

    fn children(&self) -> &[Block] {
        &self.children
    }

    fn with_reference(&self, key: RefKey) -> Block {
        let mut node = self.clone();
        node.reference = Some(key);
        node
    }

    fn with_children(&self, children: Vec<Block>) -> Block {
        let mut node = self.clone();
        node.children = children;
        node
    }
}
