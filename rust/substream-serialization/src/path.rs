//! The substream path: an ordered, root-first description of how to reach
//! one physical stream (or one logical subcolumn) within a decomposed value.
//!
//! A path is built and unwound as a stack during a single recursive walk. It
//! is never shared between walks.

use std::{fmt, sync::Arc};

use substream_column::ColumnRef;
use substream_format::DataTypeRef;

use crate::{creator::SubcolumnCreator, serialization::SerializationRef};

/// Structural role of one step in a substream path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubstreamKind {
    /// A plain stream of values.
    Regular,
    /// The null map of a nullable value.
    NullMap,
    /// The payload of a nullable value.
    NullableElements,
    /// Per-row lengths of an array.
    ArraySizes,
    /// The flattened items of an array.
    ArrayElements,
    /// The keys of a dictionary-encoded value.
    DictionaryKeys,
    /// The per-row indexes into the dictionary.
    DictionaryIndexes,
    /// Positions of non-default rows of a sparse value.
    SparseOffsets,
    /// The non-default values of a sparse value.
    SparseElements,
    /// A named element of a tuple.
    ///
    /// `escape_delimiter` asks for the delimiter in front of the element name
    /// to be escaped in physical stream names.
    TupleElement { name: String, escape_delimiter: bool },
}

impl SubstreamKind {
    pub fn tuple_element(name: impl Into<String>, escape_delimiter: bool) -> SubstreamKind {
        SubstreamKind::TupleElement {
            name: name.into(),
            escape_delimiter,
        }
    }

    pub fn is_tuple_element(&self) -> bool {
        matches!(self, SubstreamKind::TupleElement { .. })
    }

    fn variant_name(&self) -> &'static str {
        match self {
            SubstreamKind::Regular => "Regular",
            SubstreamKind::NullMap => "NullMap",
            SubstreamKind::NullableElements => "NullableElements",
            SubstreamKind::ArraySizes => "ArraySizes",
            SubstreamKind::ArrayElements => "ArrayElements",
            SubstreamKind::DictionaryKeys => "DictionaryKeys",
            SubstreamKind::DictionaryIndexes => "DictionaryIndexes",
            SubstreamKind::SparseOffsets => "SparseOffsets",
            SubstreamKind::SparseElements => "SparseElements",
            SubstreamKind::TupleElement { .. } => "TupleElement",
        }
    }
}

impl fmt::Display for SubstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubstreamKind::TupleElement {
                name,
                escape_delimiter,
            } => write!(
                f,
                "TupleElement({name}, escape_tuple_delimiter={escape_delimiter})"
            ),
            other => f.write_str(other.variant_name()),
        }
    }
}

/// Data attached to a path node: the logical type, the materialized value
/// and the codec visible at this node, plus an optional wrapper transform.
///
/// Every component is optional: a walk driven by a codec alone carries no
/// type or value, and only the nodes that stand for the payload child of a
/// wrapping composite carry a `creator`.
#[derive(Debug, Clone, Default)]
pub struct SubstreamData {
    pub data_type: Option<DataTypeRef>,
    pub column: Option<ColumnRef>,
    pub serialization: Option<SerializationRef>,
    pub creator: Option<Arc<SubcolumnCreator>>,
}

impl SubstreamData {
    pub fn new(serialization: SerializationRef) -> SubstreamData {
        SubstreamData {
            serialization: Some(serialization),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, data_type: Option<DataTypeRef>) -> SubstreamData {
        self.data_type = data_type;
        self
    }

    pub fn with_column(mut self, column: Option<ColumnRef>) -> SubstreamData {
        self.column = column;
        self
    }

    pub fn with_creator(mut self, creator: SubcolumnCreator) -> SubstreamData {
        self.creator = Some(Arc::new(creator));
        self
    }
}

/// One node of a substream path.
#[derive(Debug, Clone)]
pub struct Substream {
    pub kind: SubstreamKind,
    pub data: SubstreamData,
}

impl Substream {
    pub fn new(kind: SubstreamKind) -> Substream {
        Substream {
            kind,
            data: SubstreamData::default(),
        }
    }

    pub fn with_data(kind: SubstreamKind, data: SubstreamData) -> Substream {
        Substream { kind, data }
    }
}

impl From<SubstreamKind> for Substream {
    fn from(kind: SubstreamKind) -> Substream {
        Substream::new(kind)
    }
}

impl fmt::Display for Substream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Root-first sequence of substream nodes.
///
/// Dereferences to `[Substream]` for read access; modification goes through
/// [`push`](Self::push)/[`pop`](Self::pop) or the scoped
/// [`push_scoped`](Self::push_scoped).
#[derive(Debug, Clone, Default)]
pub struct SubstreamPath(Vec<Substream>);

impl SubstreamPath {
    pub fn new() -> SubstreamPath {
        Default::default()
    }

    /// Builds a path of data-less nodes.
    pub fn from_kinds(kinds: impl IntoIterator<Item = SubstreamKind>) -> SubstreamPath {
        SubstreamPath(kinds.into_iter().map(Substream::new).collect())
    }

    pub fn push(&mut self, node: impl Into<Substream>) {
        self.0.push(node.into());
    }

    pub fn pop(&mut self) -> Option<Substream> {
        self.0.pop()
    }

    /// Pushes `node` and returns a guard that pops it when dropped, including
    /// on early return and unwinding.
    pub fn push_scoped(&mut self, node: impl Into<Substream>) -> PathGuard<'_> {
        self.push(node);
        PathGuard { path: self }
    }

    pub fn last_mut(&mut self) -> Option<&mut Substream> {
        self.0.last_mut()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &SubstreamKind> {
        self.0.iter().map(|node| &node.kind)
    }

    /// Array nesting depth: the number of `ArrayElements` nodes in the path.
    pub fn array_level(&self) -> usize {
        array_level(self)
    }

    /// Returns `false` if the path leads to a structural stream (null map,
    /// array sizes, dictionary indexes, sparse offsets) that must not get
    /// content-aware compression.
    pub fn is_special_compression_allowed(&self) -> bool {
        !self.kinds().any(|kind| {
            matches!(
                kind,
                SubstreamKind::NullMap
                    | SubstreamKind::ArraySizes
                    | SubstreamKind::DictionaryIndexes
                    | SubstreamKind::SparseOffsets
            )
        })
    }

    /// Returns `true` if the first `prefix_len` nodes address a named,
    /// logical subcolumn: the last node of the prefix is a `NullMap`, a
    /// `TupleElement` or an `ArraySizes`.
    pub fn has_subcolumn_for_path(&self, prefix_len: usize) -> bool {
        if prefix_len == 0 || prefix_len > self.len() {
            return false;
        }
        matches!(
            self[prefix_len - 1].kind,
            SubstreamKind::NullMap | SubstreamKind::TupleElement { .. } | SubstreamKind::ArraySizes
        )
    }
}

/// Array nesting depth of a sequence of nodes.
pub fn array_level(nodes: &[Substream]) -> usize {
    nodes
        .iter()
        .filter(|node| node.kind == SubstreamKind::ArrayElements)
        .count()
}

impl std::ops::Deref for SubstreamPath {
    type Target = [Substream];

    fn deref(&self) -> &[Substream] {
        &self.0
    }
}

impl fmt::Display for SubstreamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, node) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str("}")
    }
}

/// Scope of one pushed node. Pops the node on drop.
pub struct PathGuard<'a> {
    path: &'a mut SubstreamPath,
}

impl PathGuard<'_> {
    /// Replaces the node owned by this guard.
    pub fn replace(&mut self, node: impl Into<Substream>) {
        let last = self.path.0.len() - 1;
        self.path.0[last] = node.into();
    }
}

impl std::ops::Deref for PathGuard<'_> {
    type Target = SubstreamPath;

    fn deref(&self) -> &SubstreamPath {
        self.path
    }
}

impl std::ops::DerefMut for PathGuard<'_> {
    fn deref_mut(&mut self) -> &mut SubstreamPath {
        self.path
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.pop();
    }
}
