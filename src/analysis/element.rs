//! Code element tree reconstructed from analyzer output.
//!
//! The tree is an arena: `CodeTree` owns every node and `CodeElement` is a
//! cheap borrowed handle. Parent links are plain ids, so they never own
//! their target.

use std::fmt;

/// Kind of a structural element reported by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Synthetic element spanning the whole file.
    Root,
    Class,
    Function,
    Field,
    Property,
    Comment,
    /// Any kind the engine does not score, kept under its reported name.
    Other(String),
}

impl ElementKind {
    /// Map an analyzer kind name to an element kind.
    pub fn parse(name: &str) -> Self {
        match name {
            "root" => ElementKind::Root,
            "class" => ElementKind::Class,
            "function" => ElementKind::Function,
            "field" => ElementKind::Field,
            "property" => ElementKind::Property,
            "comment" => ElementKind::Comment,
            other => ElementKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Root => "root",
            ElementKind::Class => "class",
            ElementKind::Function => "function",
            ElementKind::Field => "field",
            ElementKind::Property => "property",
            ElementKind::Comment => "comment",
            ElementKind::Other(name) => name,
        }
    }

    /// Whether the kind counts toward the property/field term.
    pub fn is_property_or_field(&self) -> bool {
        matches!(self, ElementKind::Field | ElementKind::Property)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Index of an element inside its `CodeTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    /// Id of the root element of every tree.
    pub const ROOT: ElementId = ElementId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    kind: ElementKind,
    start: u64,
    end: u64,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// Owner of a reconstructed element tree.
///
/// Nodes are stored in emission order with the root first. Two trees built
/// from the same analyzer output compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTree {
    nodes: Vec<Node>,
}

impl CodeTree {
    /// A tree holding only an empty root (`[0-0]`, no children).
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: ElementKind::Root,
                start: 0,
                end: 0,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> CodeElement<'_> {
        CodeElement {
            tree: self,
            id: ElementId::ROOT,
        }
    }

    pub fn get(&self, id: ElementId) -> Option<CodeElement<'_>> {
        (id.0 < self.nodes.len()).then_some(CodeElement { tree: self, id })
    }

    /// Number of elements excluding the root.
    pub fn element_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the analyzer reported anything at all.
    pub fn has_elements(&self) -> bool {
        self.element_count() > 0
    }

    /// All non-root elements in emission order.
    pub fn elements(&self) -> impl Iterator<Item = CodeElement<'_>> + '_ {
        (1..self.nodes.len()).map(move |i| CodeElement {
            tree: self,
            id: ElementId(i),
        })
    }

    /// Append an element under `parent` and return its id.
    pub(crate) fn attach(
        &mut self,
        parent: ElementId,
        kind: ElementKind,
        start: u64,
        end: u64,
    ) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            start,
            end,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Raise the root's end offset to at least `end`.
    pub(crate) fn extend_root(&mut self, end: u64) {
        let root = &mut self.nodes[ElementId::ROOT.0];
        root.end = root.end.max(end);
    }

    fn node(&self, id: ElementId) -> &Node {
        &self.nodes[id.0]
    }
}

impl Default for CodeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view of one element in a `CodeTree`.
#[derive(Clone, Copy)]
pub struct CodeElement<'a> {
    tree: &'a CodeTree,
    id: ElementId,
}

impl<'a> CodeElement<'a> {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> &'a ElementKind {
        &self.tree.node(self.id).kind
    }

    pub fn start(&self) -> u64 {
        self.tree.node(self.id).start
    }

    pub fn end(&self) -> u64 {
        self.tree.node(self.id).end
    }

    pub fn is_root(&self) -> bool {
        self.id == ElementId::ROOT
    }

    pub fn parent(&self) -> Option<CodeElement<'a>> {
        let tree = self.tree;
        tree.node(self.id)
            .parent
            .map(|id| CodeElement { tree, id })
    }

    /// Direct children in attachment order.
    pub fn children(&self) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        let tree = self.tree;
        tree.node(self.id)
            .children
            .iter()
            .map(move |&id| CodeElement { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.tree.node(self.id).children.len()
    }

    /// Whether `[start, end]` lies within this element's range.
    pub fn contains(&self, start: u64, end: u64) -> bool {
        self.start() <= start && self.end() >= end
    }

    /// Direct children of the given kind.
    pub fn children_of_kind(
        &self,
        kind: &'a ElementKind,
    ) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        self.children().filter(move |child| child.kind() == kind)
    }

    /// This element if it is a class, followed by its direct class children.
    pub fn classes(&self) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        std::iter::once(*self)
            .chain(self.children())
            .filter(|e| *e.kind() == ElementKind::Class)
    }

    pub fn functions(&self) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        self.children()
            .filter(|e| *e.kind() == ElementKind::Function)
    }

    pub fn fields(&self) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        self.children().filter(|e| *e.kind() == ElementKind::Field)
    }

    pub fn properties(&self) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        self.children()
            .filter(|e| *e.kind() == ElementKind::Property)
    }

    pub fn comments(&self) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        self.children().filter(|e| *e.kind() == ElementKind::Comment)
    }

    /// Fields followed by properties.
    pub fn properties_or_fields(&self) -> impl Iterator<Item = CodeElement<'a>> + 'a {
        self.fields().chain(self.properties())
    }

    /// Number of ancestors between this element and the root.
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), |p| p.parent()).count()
    }
}

impl fmt::Debug for CodeElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}-{}]", self.kind(), self.start(), self.end())
    }
}

impl fmt::Display for CodeElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
