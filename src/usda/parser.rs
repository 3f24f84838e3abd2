use anyhow::{Context, Result};

use crate::error::{Position, SyntaxError};

use super::{
    syntax::{Node, Rule},
    token::{self, Spanned, Token},
};

/// Parser translates a list of tokens into an untyped syntax tree.
///
/// Recursive descent over the grammar below, one function per rule.
/// Alternatives are picked with a single token of lookahead, except for
/// assignments where the typed form is attempted first and the parser
/// backtracks to a saved position for the untyped one.
///
/// ```text
/// document   := metadata? statement*
/// statement  := assignment | block
/// assignment := "prepend"? "custom"? "uniform"? (type "[]"?)? Name ("=" value)? metadata?
/// block      := ("def"|"class"|"over") (Name String | String String?) metadata? scope
/// metadata   := "(" (statement | String)* ")"
/// scope      := "{" statement* "}"
/// value      := String | Number | Reference | "true" | "false" | array
/// array      := "[" (value ("," value)* ","?)? "]" | "(" (value ("," value)*)? ")" | "[]"
/// ```
///
/// Arrays, metadata and scopes may nest at most [MAX_DEPTH] levels deep.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned<'a>>,
    pos: usize,
    depth: usize,
}

/// Nesting limit for arrays, metadata and scopes.
pub const MAX_DEPTH: usize = 128;

impl<'a> Parser<'a> {
    /// Tokenizes `source` up front, lexing errors surface here.
    pub fn new(source: &'a str) -> Result<Self> {
        let tokens = token::tokenize(source)?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    #[inline]
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|spanned| spanned.token)
    }

    #[inline]
    fn peek_pun(&self, ch: char) -> bool {
        self.peek().map_or(false, |token| token.is_pun(ch))
    }

    /// Syntax error pointing at the current token.
    fn unexpected(&self, expected: &str) -> anyhow::Error {
        let (position, found) = match self.tokens.get(self.pos) {
            Some(spanned) => (
                Position::locate(self.source, spanned.span.start),
                format!("'{}'", &self.source[spanned.span.clone()]),
            ),
            None => (
                Position::locate(self.source, self.source.len()),
                String::from("end of input"),
            ),
        };

        SyntaxError {
            position,
            found,
            expected: expected.to_string(),
        }
        .into()
    }

    fn ensure_pun(&mut self, ch: char) -> Result<()> {
        if !self.peek_pun(ch) {
            return Err(self.unexpected(&format!("'{}'", ch)));
        }

        self.pos += 1;
        Ok(())
    }

    /// Enters a nested rule, fails at the current token once too deep.
    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(self.unexpected(&format!("at most {} nesting levels", MAX_DEPTH)));
        }

        self.depth += 1;
        Ok(())
    }

    #[inline]
    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn fetch_name(&mut self) -> Option<Token<'a>> {
        let next = self.peek().filter(Token::is_name)?;
        self.pos += 1;
        Some(next)
    }

    /// Parse tokens to a syntax tree rooted at [Rule::Start].
    pub fn parse(&mut self) -> Result<Node<'a>> {
        let mut root = Node::new(Rule::Start);

        if self.peek_pun('(') {
            let metadata = self.parse_metadata().context("Unable to parse layer metadata")?;
            root.push_node(metadata);
        }

        while self.peek().is_some() {
            root.push_node(self.parse_statement()?);
        }

        log::debug!("Parsed {} top level statements", root.children.len());

        Ok(root)
    }

    fn parse_statement(&mut self) -> Result<Node<'a>> {
        let mut node = Node::new(Rule::Statement);

        let inner = match self.peek() {
            Some(token) if token.is_specifier() => self.parse_block()?,
            Some(token) if token.is_qualifier() || token.is_name() => self.parse_assignment()?,
            _ => return Err(self.unexpected("'def', 'class', 'over' or a property declaration")),
        };

        node.push_node(inner);
        Ok(node)
    }

    /// Reads `type "[]"? Name`, returns `None` if the tokens don't fit.
    fn parse_typed_declaration(&mut self) -> Option<Vec<Token<'a>>> {
        let mut tokens = vec![self.fetch_name()?];

        if self.peek() == Some(Token::ArrayMarker) {
            self.pos += 1;
            tokens.push(Token::ArrayMarker);
        }

        tokens.push(self.fetch_name()?);
        Some(tokens)
    }

    fn parse_assignment(&mut self) -> Result<Node<'a>> {
        let mut node = Node::new(Rule::Assignment);

        // Each qualifier at most once, in this order.
        for qualifier in [Token::Prepend, Token::Custom, Token::Uniform] {
            if self.peek() == Some(qualifier) {
                self.pos += 1;
                node.push_token(qualifier);
            }
        }

        let checkpoint = self.pos;

        match self.parse_typed_declaration() {
            Some(tokens) => tokens.into_iter().for_each(|token| node.push_token(token)),
            None => {
                log::trace!("Backtracking to untyped assignment at token {}", checkpoint);
                self.pos = checkpoint;

                // Without a type, the key must be assigned a value.
                let key = self.fetch_name().ok_or_else(|| self.unexpected("property name"))?;
                if !self.peek_pun('=') {
                    return Err(self.unexpected("property name or '='"));
                }

                node.push_token(key);
            }
        }

        if self.peek_pun('=') {
            self.pos += 1;
            node.push_token(Token::Punctuation('='));
            node.push_node(self.parse_value()?);
        }

        if self.peek_pun('(') {
            node.push_node(self.parse_metadata()?);
        }

        Ok(node)
    }

    fn parse_block(&mut self) -> Result<Node<'a>> {
        let mut node = Node::new(Rule::Block);

        // Each primitive starts with specifier.
        let specifier = self
            .peek()
            .filter(Token::is_specifier)
            .ok_or_else(|| self.unexpected("'def', 'class' or 'over'"))?;
        self.pos += 1;
        node.push_token(specifier);

        let typed = match self.fetch_name() {
            Some(ty) => {
                node.push_token(ty);
                true
            }
            None => false,
        };

        // Name literal, optionally preceded by a quoted type when no bare one was given.
        let name = self.peek().filter(Token::is_string).ok_or_else(|| self.unexpected("prim name"))?;
        self.pos += 1;
        node.push_token(name);

        if !typed {
            if let Some(name) = self.peek().filter(Token::is_string) {
                self.pos += 1;
                node.push_token(name);
            }
        }

        if self.peek_pun('(') {
            node.push_node(self.parse_metadata()?);
        }

        node.push_node(self.parse_scope()?);

        Ok(node)
    }

    fn parse_metadata(&mut self) -> Result<Node<'a>> {
        let mut node = Node::new(Rule::Metadata);

        self.descend()?;
        self.ensure_pun('(')?;

        loop {
            match self.peek() {
                Some(Token::Punctuation(')')) => {
                    self.pos += 1;
                    break;
                }
                Some(doc @ Token::String(_)) => {
                    self.pos += 1;

                    let mut entry = Node::new(Rule::Doc);
                    entry.push_token(doc);
                    node.push_node(entry);
                }
                Some(_) => node.push_node(self.parse_statement()?),
                None => return Err(self.unexpected("')'")),
            }
        }

        self.ascend();
        Ok(node)
    }

    fn parse_scope(&mut self) -> Result<Node<'a>> {
        let mut node = Node::new(Rule::Scope);

        self.descend()?;
        self.ensure_pun('{')?;

        loop {
            match self.peek() {
                Some(Token::Punctuation('}')) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => node.push_node(self.parse_statement()?),
                None => return Err(self.unexpected("'}'")),
            }
        }

        self.ascend();
        Ok(node)
    }

    fn parse_value(&mut self) -> Result<Node<'a>> {
        let mut node = Node::new(Rule::Value);

        match self.peek() {
            Some(
                literal @ (Token::String(_)
                | Token::Number(_)
                | Token::Reference(_)
                | Token::True
                | Token::False),
            ) => {
                self.pos += 1;
                node.push_token(literal);
            }
            Some(Token::ArrayMarker) => {
                self.pos += 1;
                node.push_node(Node::new(Rule::Array));
            }
            Some(Token::Punctuation('[')) => node.push_node(self.parse_array('[', ']')?),
            Some(Token::Punctuation('(')) => node.push_node(self.parse_array('(', ')')?),
            _ => return Err(self.unexpected("value")),
        }

        Ok(node)
    }

    /// Reads a delimited, comma separated list of values.
    ///
    /// Only bracketed arrays accept a trailing comma.
    fn parse_array(&mut self, open: char, close: char) -> Result<Node<'a>> {
        let mut node = Node::new(Rule::Array);

        self.descend()?;
        self.ensure_pun(open)?;

        // Special case - empty array like [ ]
        if self.peek_pun(close) {
            self.pos += 1;
            self.ascend();
            return Ok(node);
        }

        loop {
            node.push_node(self.parse_value()?);

            if self.peek_pun(',') {
                self.pos += 1;

                if open == '[' && self.peek_pun(close) {
                    self.pos += 1;
                    break;
                }

                continue;
            }

            self.ensure_pun(close)?;
            break;
        }

        self.ascend();
        Ok(node)
    }
}
