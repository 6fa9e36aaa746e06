use chumsky::prelude::*;
use std::fmt;
use std::rc::Rc;

use crate::diagnostic::{Diagnostic, Label, Span};

/// The fixed operator set of the language. Every operator is n-ary at
/// the syntax level; arity rules live in the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Assign,    // =
    Lookup,    // !
    Cond,      // ?
    Or,        // |
    And,       // &
    Eq,        // ==
    NotEq,     // !=
    GreaterEq, // >=
    LessEq,    // <=
    Less,      // <
    Greater,   // >
    Define,    // ^
    Call,      // @
    Include,   // #
    Syscall,   // ~
    Add,       // +
    Sub,       // -
    Mul,       // *
    Div,       // /
}

impl Op {
    pub fn from_symbol(symbol: &str) -> Option<Op> {
        match symbol {
            "=" => Some(Op::Assign),
            "!" => Some(Op::Lookup),
            "?" => Some(Op::Cond),
            "|" => Some(Op::Or),
            "&" => Some(Op::And),
            "==" => Some(Op::Eq),
            "!=" => Some(Op::NotEq),
            ">=" => Some(Op::GreaterEq),
            "<=" => Some(Op::LessEq),
            "<" => Some(Op::Less),
            ">" => Some(Op::Greater),
            "^" => Some(Op::Define),
            "@" => Some(Op::Call),
            "#" => Some(Op::Include),
            "~" => Some(Op::Syscall),
            "+" => Some(Op::Add),
            "-" => Some(Op::Sub),
            "*" => Some(Op::Mul),
            "/" => Some(Op::Div),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Operator(Op),
    StringLit,
    NumberLit,
    Identifier,
    ScopeIn,
    ScopeOut,
    StructStart,
    StructEnd,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub lexeme: Rc<str>,
    pub kind: TokenKind,
    pub span: Span,
}

// Spans are positional metadata; token identity is lexeme and kind.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.lexeme == other.lexeme && self.kind == other.kind
    }
}

impl Token {
    pub fn new(lexeme: impl Into<Rc<str>>, kind: TokenKind, span: Span) -> Self {
        Self {
            lexeme: lexeme.into(),
            kind,
            span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub lexeme: String,
    pub span: Span,
}

impl LexError {
    pub fn unrecognized(lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(format!("`{}` did not match any token kind", self.lexeme))
            .with_code("E0001")
            .with_label(Label::new(self.span, "unrecognized word"))
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' did not match any token kind", self.lexeme)
    }
}

impl std::error::Error for LexError {}

/// Splits source text into whitespace-separated words, honoring quote
/// and escape rules: a `\` makes the next character literal and is
/// dropped; inside `"..."` whitespace no longer separates; quote
/// characters stay part of the word. A quote left open at end of input
/// swallows the remainder into one word.
fn words<'a>(
) -> impl Parser<'a, &'a str, Vec<(String, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    let escaped = just('\\')
        .ignore_then(any().or_not())
        .map(|escapee: Option<char>| escapee.map(String::from).unwrap_or_default());

    let quoted = just('"')
        .ignore_then(
            choice((just('\\').ignore_then(any()), none_of("\\\"")))
                .repeated()
                .collect::<String>(),
        )
        .then(just('"').or_not())
        .map(|(inner, closing)| {
            let mut word = String::with_capacity(inner.len() + 2);
            word.push('"');
            word.push_str(&inner);
            if closing.is_some() {
                word.push('"');
            }
            word
        });

    let bare = none_of(" \t\r\n\\\"").map(String::from);

    let word = choice((quoted, escaped, bare))
        .repeated()
        .at_least(1)
        .collect::<Vec<String>>()
        .map(|parts| parts.concat())
        .map_with(|word, e| (word, e.span()));

    let separator = one_of(" \t\r\n").repeated();

    separator
        .clone()
        .ignore_then(word.then_ignore(separator).repeated().collect())
        .then_ignore(end())
}

/// Classifies one word, in fixed priority order: operator symbols,
/// string literal, number literal, brackets, catch-all identifier.
fn classify(word: &str) -> Option<TokenKind> {
    if let Some(op) = Op::from_symbol(word) {
        return Some(TokenKind::Operator(op));
    }
    if is_string_literal(word) {
        return Some(TokenKind::StringLit);
    }
    if !word.is_empty() && word.bytes().all(|byte| byte.is_ascii_digit()) {
        return Some(TokenKind::NumberLit);
    }
    match word {
        "(" => return Some(TokenKind::ScopeIn),
        ")" => return Some(TokenKind::ScopeOut),
        "{" => return Some(TokenKind::StructStart),
        "}" => return Some(TokenKind::StructEnd),
        _ => {}
    }
    if word.is_empty() {
        None
    } else {
        Some(TokenKind::Identifier)
    }
}

// The closing quote must not itself be a (literal) backslash escape
// survivor, i.e. `"a\` + `"` never reads as a complete literal.
fn is_string_literal(word: &str) -> bool {
    word.len() >= 2
        && word.starts_with('"')
        && word.ends_with('"')
        && !word[..word.len() - 1].ends_with('\\')
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let scanned = match words().parse(source).into_result() {
        Ok(scanned) => scanned,
        Err(errors) => {
            let span = errors
                .first()
                .map(|error| Span::new(error.span().start, error.span().end))
                .unwrap_or_else(Span::dummy);
            let lexeme = source
                .get(span.start..span.end)
                .unwrap_or_default()
                .to_string();
            return Err(LexError::unrecognized(lexeme, span));
        }
    };

    let mut tokens = Vec::with_capacity(scanned.len());
    for (word, span) in scanned {
        if word.is_empty() {
            continue;
        }
        let span = Span::new(span.start, span.end);
        match classify(&word) {
            Some(kind) => tokens.push(Token::new(word, kind, span)),
            None => return Err(LexError::unrecognized(word, span)),
        }
    }

    Ok(tokens)
}
