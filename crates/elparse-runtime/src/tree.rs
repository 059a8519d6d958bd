//! Syntax tree built by semantic actions.

use std::{fmt, rc::Rc};

/// The maximum number of children of an operation node.
pub const MAX_SYNTAX_NODE_CHILDREN: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    /// An identifier.
    Symbol(Rc<str>),
    /// A string literal.
    Literal(Rc<str>),
    /// An integer constant.
    Constant(i64),
    /// An interior node. Absent children are kept as `None` in their slot.
    Operation {
        tag: Rc<str>,
        children: Vec<Option<SyntaxNode>>,
    },
}

impl SyntaxNode {
    pub fn operation<I>(tag: impl Into<Rc<str>>, children: I) -> Self
    where
        I: IntoIterator<Item = Option<SyntaxNode>>,
    {
        Self::Operation {
            tag: tag.into(),
            children: children.into_iter().collect(),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Operation { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Option<SyntaxNode>] {
        match self {
            Self::Operation { children, .. } => &children[..],
            _ => &[],
        }
    }

    /// Return the child at `index`, if the slot exists and is not empty.
    pub fn child(&self, index: usize) -> Option<&SyntaxNode> {
        self.children().get(index).and_then(Option::as_ref)
    }
}

// Left-recursive rules build chains as deep as the input is long, so the
// children are released from a worklist instead of by recursion.
impl Drop for SyntaxNode {
    fn drop(&mut self) {
        let Self::Operation { children, .. } = self else {
            return;
        };
        let mut pending: Vec<SyntaxNode> = children.drain(..).flatten().collect();
        while let Some(mut node) = pending.pop() {
            if let Self::Operation { children, .. } = &mut node {
                pending.extend(children.drain(..).flatten());
            }
        }
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(name) => f.write_str(name),
            Self::Literal(text) => write!(f, "\"{}\"", text),
            Self::Constant(value) => write!(f, "{}", value),
            Self::Operation { tag, .. } => f.write_str(tag),
        }
    }
}

/// An entry of the driver's value stack.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No synthesized value, e.g. punctuation or an alternative without action.
    #[default]
    Empty,
    Symbol(Rc<str>),
    Literal(Rc<str>),
    Constant(i64),
    Node(SyntaxNode),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Convert this value into a tree node, turning token records into leaves.
    pub fn into_node(self) -> Option<SyntaxNode> {
        match self {
            Self::Empty => None,
            Self::Symbol(name) => Some(SyntaxNode::Symbol(name)),
            Self::Literal(text) => Some(SyntaxNode::Literal(text)),
            Self::Constant(value) => Some(SyntaxNode::Constant(value)),
            Self::Node(node) => Some(node),
        }
    }
}

/// The result of a successful parse.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxTree {
    root: Option<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new(root: Option<SyntaxNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&SyntaxNode> {
        self.root.as_ref()
    }

    pub fn into_root(self) -> Option<SyntaxNode> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = &self.root else {
            return Ok(());
        };

        // (prefix, node, is the last child)
        let mut stack = vec![(String::new(), Some(root), true)];
        while let Some((prefix, node, tail)) = stack.pop() {
            let connector = if tail { "└── " } else { "├── " };
            let Some(node) = node else {
                writeln!(f, "{}{}(none)", prefix, connector)?;
                continue;
            };
            writeln!(f, "{}{}{}", prefix, connector, node)?;

            let children = node.children();
            let prefix = format!("{}{}", prefix, if tail { "    " } else { "│   " });
            for (i, child) in children.iter().enumerate().rev() {
                stack.push((prefix.clone(), child.as_ref(), i + 1 == children.len()));
            }
        }
        Ok(())
    }
}
