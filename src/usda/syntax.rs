//! Untyped syntax tree produced by the parser.
//!
//! Nodes are tagged with the grammar rule that built them and own their
//! children in source order. Tokens are kept as leaves, so the projector can
//! recover everything the parser saw (including which optional parts of a
//! rule were present).

use strum::Display;

use super::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
    /// Whole document: optional layer metadata followed by statements.
    Start,
    /// Wraps either an assignment or a block.
    Statement,
    Assignment,
    Block,
    /// Scalar literal (single token leaf) or a nested array.
    Value,
    Array,
    /// `( ... )` attached to a document, block or assignment.
    Metadata,
    /// `{ ... }` body of a block.
    Scope,
    /// Bare string inside metadata.
    Doc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Child<'a> {
    Node(Node<'a>),
    Token(Token<'a>),
}

impl<'a> Child<'a> {
    #[inline]
    pub fn as_node(&self) -> Option<&Node<'a>> {
        match self {
            Child::Node(node) => Some(node),
            Child::Token(_) => None,
        }
    }

    #[inline]
    pub fn as_token(&self) -> Option<Token<'a>> {
        match self {
            Child::Token(token) => Some(*token),
            Child::Node(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub rule: Rule,
    pub children: Vec<Child<'a>>,
}

impl<'a> Node<'a> {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn push_token(&mut self, token: Token<'a>) {
        self.children.push(Child::Token(token));
    }

    #[inline]
    pub fn push_node(&mut self, node: Node<'a>) {
        self.children.push(Child::Node(node));
    }

    /// Child nodes, skipping token leaves.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<'a>> {
        self.children.iter().filter_map(Child::as_node)
    }

    /// Token leaves, skipping child nodes.
    pub fn tokens(&self) -> impl Iterator<Item = Token<'a>> + '_ {
        self.children.iter().filter_map(Child::as_token)
    }

    /// First direct child node built by `rule`.
    pub fn find(&self, rule: Rule) -> Option<&Node<'a>> {
        self.nodes().find(|node| node.rule == rule)
    }
}
