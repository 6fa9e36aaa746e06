use std::rc::Rc;

use crate::lexer::{Token, TokenKind};

/// One node of the parse tree: an ordered list of branches plus an
/// optional value token. A node without a value is a pure statement
/// group (the program root, or a bracketed block whose operator token
/// never arrived).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub value: Option<Token>,
    pub branches: Vec<Rc<Node>>,
}

impl Node {
    pub fn group() -> Self {
        Self {
            value: None,
            branches: Vec::new(),
        }
    }

    pub fn leaf(token: Token) -> Self {
        Self {
            value: Some(token),
            branches: Vec::new(),
        }
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.value.as_ref().map(|token| token.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub root: Rc<Node>,
}
