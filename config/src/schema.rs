//! Schema tree and leaf path derivation.
//!
//! A schema is a static tree of sections and leaves. Every node is explicitly
//! tagged: a value that should be stored as one opaque leaf is declared as a
//! leaf, never inferred from its shape.
//!
//! ```
//! use sysconf_config::schema;
//! use sysconf_config::schema::{Node, ValueKind};
//!
//! const LIMITS: Node = schema! {
//!     limits: {
//!         retryCount: Number,
//!     },
//! };
//!
//! let leaf = LIMITS.lookup("limits.retryCount").unwrap();
//! assert_eq!(leaf.kind, ValueKind::Number);
//! assert!(LIMITS.lookup("limits").is_none());
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Separator between the segments of a joined path.
pub const SEPARATOR: char = '.';

/// Deepest nesting accepted by [`Node::paths`].
pub const MAX_DEPTH: usize = 16;

/// The closed set of storable leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    Text,
    Number,
    Boolean,
    TextList,
}

impl ValueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::TextList => "text list",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf node: the kind it holds and whether an explicit null is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Leaf {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl Leaf {
    pub const fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Node {
    Leaf(Leaf),
    Section(&'static [Field]),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub node: Node,
}

/// Root-to-leaf sequence of field names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeafPath(Vec<&'static str>);

impl LeafPath {
    pub fn segments(&self) -> &[&'static str] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Joins the segments with `separator`; `None` for an empty path.
    pub fn join(&self, separator: char) -> Option<String> {
        join_segments(&self.0, separator)
    }
}

impl fmt::Display for LeafPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_segments(&self.0, SEPARATOR).unwrap_or_default())
    }
}

/// Joins path segments: nothing for zero segments, the name itself for one,
/// and `first + separator + join(rest)` for more.
pub fn join_segments(segments: &[&str], separator: char) -> Option<String> {
    match segments {
        [] => None,
        [only] => Some((*only).to_string()),
        [first, rest @ ..] => join_segments(rest, separator).map(|tail| format!("{first}{separator}{tail}")),
    }
}

impl Node {
    /// Every root-to-leaf path, depth first, in declaration order.
    ///
    /// A root that is itself a leaf has no paths: a path must pass through
    /// at least one field.
    pub fn paths(&self) -> Result<Vec<(LeafPath, Leaf)>, SchemaError> {
        let mut out = Vec::new();
        if let Self::Section(fields) = *self {
            collect(fields, &mut Vec::new(), &mut out)?;
        }

        let mut seen = HashSet::with_capacity(out.len());
        for (path, _) in &out {
            let joined = path.to_string();
            if !seen.insert(joined.clone()) {
                return Err(SchemaError::AmbiguousPath { path: joined });
            }
        }

        Ok(out)
    }

    /// Number of leaves reachable from this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Section(fields) => fields.iter().map(|f| f.node.leaf_count()).sum(),
        }
    }

    /// Resolves a joined path to the leaf it names.
    ///
    /// Paths that stop at a section, continue past a leaf, or contain an empty
    /// segment resolve to `None`.
    pub const fn lookup(&self, path: &str) -> Option<Leaf> {
        match *self {
            Self::Leaf(_) => None,
            Self::Section(fields) => lookup_in(fields, path.as_bytes(), 0),
        }
    }

    pub const fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }
}

fn collect(
    fields: &'static [Field],
    prefix: &mut Vec<&'static str>,
    out: &mut Vec<(LeafPath, Leaf)>,
) -> Result<(), SchemaError> {
    if prefix.len() >= MAX_DEPTH {
        return Err(SchemaError::TooDeep {
            path: join_segments(prefix, SEPARATOR).unwrap_or_default(),
            max: MAX_DEPTH,
        });
    }

    let mut names = HashSet::with_capacity(fields.len());
    for field in fields {
        if field.name.is_empty() {
            return Err(SchemaError::EmptyName {
                parent: join_segments(prefix, SEPARATOR).unwrap_or_else(|| "<root>".to_string()),
            });
        }
        if field.name.contains(SEPARATOR) {
            return Err(SchemaError::SeparatorInName {
                name: field.name.to_string(),
            });
        }

        prefix.push(field.name);
        if !names.insert(field.name) {
            return Err(SchemaError::DuplicateField {
                path: join_segments(prefix, SEPARATOR).unwrap_or_default(),
            });
        }
        match field.node {
            Node::Leaf(leaf) => out.push((LeafPath(prefix.clone()), leaf)),
            Node::Section(children) => collect(children, prefix, out)?,
        }
        prefix.pop();
    }

    Ok(())
}

const fn lookup_in(fields: &[Field], path: &[u8], start: usize) -> Option<Leaf> {
    let mut end = start;
    while end < path.len() && path[end] != SEPARATOR as u8 {
        end += 1;
    }

    let mut i = 0;
    while i < fields.len() {
        let field = &fields[i];
        if segment_eq(field.name.as_bytes(), path, start, end) {
            let last = end == path.len();
            return match field.node {
                Node::Leaf(leaf) if last => Some(leaf),
                Node::Section(children) if !last => lookup_in(children, path, end + 1),
                _ => None,
            };
        }
        i += 1;
    }

    None
}

const fn segment_eq(name: &[u8], path: &[u8], start: usize, end: usize) -> bool {
    if name.len() != end - start {
        return false;
    }
    let mut i = 0;
    while i < name.len() {
        if name[i] != path[start + i] {
            return false;
        }
        i += 1;
    }
    true
}

pub(crate) const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    a.len() == b.len() && segment_eq(a, b, 0, b.len())
}

/// Declares a static schema tree.
///
/// Sections are written as nested braces; leaves name their [`ValueKind`],
/// optionally followed by `| null` when an explicit null is a legal value.
#[macro_export]
macro_rules! schema {
    (@node { $($inner:tt)* }) => {
        $crate::schema!($($inner)*)
    };
    (@node $kind:ident null) => {
        $crate::schema::Node::Leaf($crate::schema::Leaf {
            kind: $crate::schema::ValueKind::$kind,
            nullable: true,
        })
    };
    (@node $kind:ident) => {
        $crate::schema::Node::Leaf($crate::schema::Leaf {
            kind: $crate::schema::ValueKind::$kind,
            nullable: false,
        })
    };
    ($($name:ident : $node:tt $(| $null:ident)?),* $(,)?) => {
        $crate::schema::Node::Section(&[
            $(
                $crate::schema::Field {
                    name: stringify!($name),
                    node: $crate::schema!(@node $node $($null)?),
                },
            )*
        ])
    };
}
