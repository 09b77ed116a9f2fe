use std::fmt;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::types::ExpressionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceSpan {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn single_point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn union(a: &Self, b: &Self) -> Self {
        let (start_line, start_column) =
            if (a.line < b.line) || (a.line == b.line && a.column <= b.column) {
                (a.line, a.column)
            } else {
                (b.line, b.column)
            };

        let (end_line, end_column) = if (a.end_line > b.end_line)
            || (a.end_line == b.end_line && a.end_column >= b.end_column)
        {
            (a.end_line, a.end_column)
        } else {
            (b.end_line, b.end_column)
        };

        Self::new(start_line, start_column, end_line, end_column)
    }
}

/// Index of a node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Selector {
    Tag(String),
    Id(String),
    Class(String),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Tag(name) => write!(f, "{name}"),
            Selector::Id(name) => write!(f, "#{name}"),
            Selector::Class(name) => write!(f, ".{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Literal {
    Scalar(i64),
    Pixel(i64),
    Percentage(i64),
    Bool(bool),
    Color(String),
}

impl Literal {
    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Literal::Scalar(_) => ExpressionType::Scalar,
            Literal::Pixel(_) => ExpressionType::Pixel,
            Literal::Percentage(_) => ExpressionType::Percentage,
            Literal::Bool(_) => ExpressionType::Bool,
            Literal::Color(_) => ExpressionType::Color,
        }
    }

    /// The integer payload of a dimensioned literal; `None` for bools and colors.
    pub fn numeric_value(&self) -> Option<i64> {
        match self {
            Literal::Scalar(value) | Literal::Pixel(value) | Literal::Percentage(value) => {
                Some(*value)
            }
            Literal::Bool(_) | Literal::Color(_) => None,
        }
    }

    /// Build a numeric literal carrying the unit of `ty`.
    pub fn with_unit(ty: ExpressionType, value: i64) -> Option<Self> {
        match ty {
            ExpressionType::Scalar => Some(Literal::Scalar(value)),
            ExpressionType::Pixel => Some(Literal::Pixel(value)),
            ExpressionType::Percentage => Some(Literal::Percentage(value)),
            ExpressionType::Color | ExpressionType::Bool | ExpressionType::Undefined => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Scalar(value) => write!(f, "{value}"),
            Literal::Pixel(value) => write!(f, "{value}px"),
            Literal::Percentage(value) => write!(f, "{value}%"),
            Literal::Bool(true) => f.write_str("TRUE"),
            Literal::Bool(false) => f.write_str("FALSE"),
            Literal::Color(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
        }
    }

    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Operator::Add => lhs.wrapping_add(rhs),
            Operator::Subtract => lhs.wrapping_sub(rhs),
            Operator::Multiply => lhs.wrapping_mul(rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Stylesheet,
    Stylerule,
    Selector(Selector),
    Declaration,
    PropertyName(String),
    VariableAssignment,
    VariableReference(String),
    IfClause,
    ElseClause,
    Literal(Literal),
    Operation(Operator),
}

impl NodeKind {
    pub fn opens_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::Stylerule | NodeKind::IfClause | NodeKind::ElseClause
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Literal(_) | NodeKind::Operation(_) | NodeKind::VariableReference(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Stylesheet => "stylesheet",
            NodeKind::Stylerule => "stylerule",
            NodeKind::Selector(_) => "selector",
            NodeKind::Declaration => "declaration",
            NodeKind::PropertyName(_) => "property name",
            NodeKind::VariableAssignment => "variable assignment",
            NodeKind::VariableReference(_) => "variable reference",
            NodeKind::IfClause => "if clause",
            NodeKind::ElseClause => "else clause",
            NodeKind::Literal(_) => "literal",
            NodeKind::Operation(_) => "operation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub errors: Vec<String>,
    pub span: Option<SourceSpan>,
}

/// Arena-backed stylesheet tree.
///
/// Children are stored as ordered id lists, so replacing or splicing a subtree is an edit of
/// the parent's list. Nodes cut out of the tree stay allocated but are no longer reachable
/// from [`Ast::root`]; every tree-wide query walks from the root and never sees them.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub fn new() -> Self {
        let mut ast = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        ast.root = ast.add_node(NodeKind::Stylesheet, None);
        ast
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add_node(&mut self, kind: NodeKind, span: Option<SourceSpan>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
            errors: Vec::new(),
            span,
        });
        id
    }

    /// Allocate a node and attach it as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind, span: Option<SourceSpan>) -> NodeId {
        let id = self.add_node(kind, span);
        self.push_child(parent, id);
        id
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Option<SourceSpan> {
        self.nodes[id.index()].span
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.index()].children.get(index).copied()
    }

    pub fn literal(&self, id: NodeId) -> Option<&Literal> {
        match self.kind(id) {
            NodeKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Name bound by a `VariableAssignment`, read from its reference child.
    pub fn assignment_name(&self, assignment: NodeId) -> Option<&str> {
        let reference = self.child(assignment, 0)?;
        match self.kind(reference) {
            NodeKind::VariableReference(name) => Some(name),
            _ => None,
        }
    }

    /// Replace `old` with `new` in the child list of `parent`. Returns `false` when `old` is
    /// not a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> bool {
        let children = &mut self.nodes[parent.index()].children;
        match children.iter().position(|&child| child == old) {
            Some(position) => {
                children[position] = new;
                true
            }
            None => false,
        }
    }

    /// Remove the child at `index` and insert `replacement` in its place, keeping the order of
    /// the surrounding siblings.
    pub fn splice(&mut self, parent: NodeId, index: usize, replacement: Vec<NodeId>) {
        let children = &mut self.nodes[parent.index()].children;
        if index < children.len() {
            let _ = children.splice(index..=index, replacement);
        }
    }

    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let children = &mut self.nodes[parent.index()].children;
        (index < children.len()).then(|| children.remove(index))
    }

    pub fn set_error<S: Into<String>>(&mut self, id: NodeId, message: S) {
        let message = message.into();
        let errors = &mut self.nodes[id.index()].errors;
        if !errors.contains(&message) {
            errors.push(message);
        }
    }

    pub fn errors(&self, id: NodeId) -> &[String] {
        &self.nodes[id.index()].errors
    }

    /// Reachable nodes in depth-first pre-order, starting at `from`.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = vec![from];
        while let Some(id) = pending.pop() {
            order.push(id);
            pending.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    pub fn error_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| !self.errors(id).is_empty())
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.descendants(self.root)
            .into_iter()
            .any(|id| !self.errors(id).is_empty())
    }

    /// Whether any reachable node satisfies `predicate`.
    pub fn contains(&self, predicate: impl Fn(&NodeKind) -> bool) -> bool {
        self.descendants(self.root)
            .into_iter()
            .any(|id| predicate(self.kind(id)))
    }
}

struct SerializedNode<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl Serialize for SerializedNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.ast.node(self.id);
        let children: Vec<SerializedNode<'_>> = node
            .children
            .iter()
            .map(|&id| SerializedNode { ast: self.ast, id })
            .collect();
        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("kind", &node.kind)?;
        state.serialize_field("span", &node.span)?;
        state.serialize_field("errors", &node.errors)?;
        state.serialize_field("children", &children)?;
        state.end()
    }
}

impl Serialize for Ast {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerializedNode {
            ast: self,
            id: self.root,
        }
        .serialize(serializer)
    }
}
