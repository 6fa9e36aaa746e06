use std::fmt;
use std::rc::Rc;

use crate::ast::{Node, Tree};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone())
            .with_code("E0101")
            .with_label(Label::new(self.span, ""))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Builds the parse tree with an explicit stack of open nodes.
///
/// `(` pushes an anonymous group whose operator token, when one
/// arrives, is backfilled as the group's value; leaves attach to the
/// open node; `{` pushes a struct-literal node; `)` and `}` both close
/// the innermost open node. Bracket flavors are not matched against
/// each other, but unbalanced nesting is a hard error rather than a
/// corrupt tree.
pub struct TreeParser {
    stack: Vec<Node>,
}

impl TreeParser {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn parse(&mut self, tokens: &[Token]) -> Result<Tree, ParseError> {
        self.stack.clear();
        self.stack.push(Node::group());

        for token in tokens {
            match token.kind {
                TokenKind::Operator(_) => {
                    if let Some(open) = self.stack.last_mut() {
                        open.value = Some(token.clone());
                    }
                }
                TokenKind::StringLit | TokenKind::NumberLit | TokenKind::Identifier => {
                    if let Some(open) = self.stack.last_mut() {
                        open.branches.push(Rc::new(Node::leaf(token.clone())));
                    }
                }
                TokenKind::ScopeIn => {
                    self.stack.push(Node::group());
                }
                TokenKind::StructStart => {
                    self.stack.push(Node::leaf(token.clone()));
                }
                TokenKind::ScopeOut | TokenKind::StructEnd => {
                    let finished = self.stack.pop();
                    match (finished, self.stack.last_mut()) {
                        (Some(node), Some(parent)) => {
                            parent.branches.push(Rc::new(node));
                        }
                        _ => {
                            return Err(ParseError::new(
                                "unmatched closing bracket",
                                token.span,
                            ));
                        }
                    }
                }
            }
        }

        if self.stack.len() > 1 {
            let span = tokens
                .last()
                .map(|token| token.span)
                .unwrap_or_else(Span::dummy);
            return Err(ParseError::new(
                format!(
                    "{} bracket(s) left unclosed at end of input",
                    self.stack.len() - 1
                ),
                span,
            ));
        }

        match self.stack.pop() {
            Some(root) => Ok(Tree {
                root: Rc::new(root),
            }),
            None => Err(ParseError::new("empty parser stack", Span::dummy())),
        }
    }
}

impl Default for TreeParser {
    fn default() -> Self {
        Self::new()
    }
}
