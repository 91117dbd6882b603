//! Immutable table paths.
//!
//! A [`TableRef`] identifies one level of a document's nested structure: the
//! root, an object field beneath some parent, or an array-dimension level
//! for arrays nested inside arrays. Refs are created through the factory
//! functions, shared as `Arc<TableRef>`, and compared structurally, so two
//! independently built refs for the same path are interchangeable map keys.

use std::fmt;
use std::sync::Arc;

/// Discriminator of a non-root [`TableRef`] level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableRefKey {
    /// Child reached through an object field of this name.
    Name(String),
    /// Child reached through array nesting; the dimension counts array
    /// depth and starts at 2 (the first array level lives in the
    /// object-keyed child table of its field).
    Array(u32),
}

/// An immutable position in a document's nested structure.
///
/// Equality and hashing are structural over the full parent chain, never
/// identity-based. Ancestors order before their descendants, which is what
/// lets depth-ordered iteration fall out of a `BTreeMap` keyed by ref.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableRef {
    /// The root document level.
    Root,
    /// A nested level beneath `parent`.
    Child {
        /// The enclosing level.
        parent: Arc<TableRef>,
        /// Field name or array dimension that reaches this level.
        key: TableRefKey,
        /// Distance from the root (root is 0).
        depth: u32,
    },
}

impl TableRef {
    /// The canonical root path.
    #[must_use]
    pub fn root() -> Arc<Self> {
        Arc::new(Self::Root)
    }

    /// Child of `parent` reached through the object field `name`.
    #[must_use]
    pub fn child(parent: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::Child {
            parent: Arc::clone(parent),
            key: TableRefKey::Name(name.into()),
            depth: parent.depth() + 1,
        })
    }

    /// Child of `parent` reached through array nesting at `dimension`.
    #[must_use]
    pub fn array_child(parent: &Arc<Self>, dimension: u32) -> Arc<Self> {
        Arc::new(Self::Child {
            parent: Arc::clone(parent),
            key: TableRefKey::Array(dimension),
            depth: parent.depth() + 1,
        })
    }

    /// Distance from the root; the root has depth 0.
    #[must_use]
    pub fn depth(&self) -> u32 {
        match self {
            Self::Root => 0,
            Self::Child { depth, .. } => *depth,
        }
    }

    /// Whether this is the root path.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The enclosing level, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Self>> {
        match self {
            Self::Root => None,
            Self::Child { parent, .. } => Some(parent),
        }
    }

    /// Field name of this level, if it is an object-keyed child.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Child {
                key: TableRefKey::Name(n),
                ..
            } => Some(n),
            _ => None,
        }
    }

    /// Array dimension of this level, if it is an array-keyed child.
    #[must_use]
    pub fn array_dimension(&self) -> Option<u32> {
        match self {
            Self::Child {
                key: TableRefKey::Array(d),
                ..
            } => Some(*d),
            _ => None,
        }
    }

    /// Whether an ancestor-or-self chain from `self` reaches `other`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        let mut cur = self;
        loop {
            if cur == other {
                return true;
            }
            match cur.parent() {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Path components from the root down to this level, as identifier
    /// chain material. Array levels render as `$<dimension>`.
    #[must_use]
    pub fn path_components(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.depth() as usize);
        let mut cur = self;
        while let Self::Child { parent, key, .. } = cur {
            out.push(match key {
                TableRefKey::Name(n) => n.clone(),
                TableRefKey::Array(d) => format!("${d}"),
            });
            cur = parent;
        }
        out.reverse();
        out
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        write!(f, "/{}", self.path_components().join("."))
    }
}
