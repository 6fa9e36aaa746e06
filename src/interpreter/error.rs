use crate::diagnostic::{Diagnostic, Label, Span};

/// Fatal evaluation failures. Unbound variables and functions are not
/// errors; they evaluate to Null.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    NumberFormat { text: String },
    Include { origin: String, message: String },
    Syscall { message: String },
}

impl RuntimeError {
    pub fn number_format(text: impl Into<String>) -> Self {
        Self::NumberFormat { text: text.into() }
    }

    pub fn include(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Include {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn syscall(message: impl Into<String>) -> Self {
        Self::Syscall {
            message: message.into(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::NumberFormat { text } => {
                Diagnostic::error(format!("cannot interpret `{}` as a number", text))
                    .with_code("E0201")
                    .with_label(Label::new(Span::dummy(), ""))
            }
            Self::Include { origin, message } => {
                Diagnostic::error(format!("inclusion of `{}` failed", origin))
                    .with_code("E0202")
                    .with_label(Label::new(Span::dummy(), ""))
                    .with_note(message.clone())
            }
            Self::Syscall { message } => Diagnostic::error(format!("native call failed: {}", message))
                .with_code("E0203")
                .with_label(Label::new(Span::dummy(), "")),
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::NumberFormat { text } => write!(f, "not a number: '{}'", text),
            RuntimeError::Include { origin, message } => {
                write!(f, "failed to include '{}': {}", origin, message)
            }
            RuntimeError::Syscall { message } => write!(f, "syscall failed: {}", message),
        }
    }
}

impl std::error::Error for RuntimeError {}
