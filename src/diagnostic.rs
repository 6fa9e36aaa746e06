use owo_colors::OwoColorize;
use std::fmt;

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Runtime failures have no source position.
    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A label pointing at a span, with an optional short message printed
/// under the caret line.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Computes 1-based line and column from a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (index, ch) in source.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_content(source: &str, line: usize) -> Option<&str> {
    source.split('\n').nth(line.saturating_sub(1))
}

/// Renders diagnostics in the rustc style: header, location, source
/// line with a caret underline, then notes.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        let severity = match diagnostic.severity {
            Severity::Error => self.paint_red_bold("error"),
            Severity::Warning => self.paint_yellow_bold("warning"),
        };
        match &diagnostic.code {
            Some(code) => output.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code,
                self.paint_bold(&diagnostic.message)
            )),
            None => output.push_str(&format!(
                "{}: {}\n",
                severity,
                self.paint_bold(&diagnostic.message)
            )),
        }

        for label in &diagnostic.labels {
            if label.span.is_dummy() {
                continue;
            }
            self.render_label(&mut output, label);
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.paint_blue("="), note));
        }

        output
    }

    fn render_label(&self, output: &mut String, label: &Label) {
        let (line, col) = line_col(self.source, label.span.start);
        let Some(content) = line_content(self.source, line) else {
            return;
        };

        let gutter_width = line.to_string().len();
        let gutter = " ".repeat(gutter_width + 1);

        output.push_str(&format!(
            "  {} {}:{}:{}\n",
            self.paint_blue("-->"),
            self.file_name,
            line,
            col
        ));
        output.push_str(&format!("{} {}\n", gutter, self.paint_blue("|")));
        output.push_str(&format!(
            "{:>width$} {} {}\n",
            self.paint_blue(&line.to_string()),
            self.paint_blue("|"),
            content,
            width = gutter_width + 1
        ));

        // Clamp multi-line spans to the first line.
        let span_len = label.span.end.saturating_sub(label.span.start).max(1);
        let underline_len = span_len.min(content.len().saturating_sub(col - 1).max(1));
        let underline = format!("{}{}", " ".repeat(col - 1), "^".repeat(underline_len));
        output.push_str(&format!(
            "{} {} {}\n",
            gutter,
            self.paint_blue("|"),
            self.paint_red(&underline)
        ));

        if !label.message.is_empty() {
            output.push_str(&format!(
                "{} {} {}{}\n",
                gutter,
                self.paint_blue("|"),
                " ".repeat(col - 1),
                self.paint_red(&label.message)
            ));
        }

        output.push_str(&format!("{} {}\n", gutter, self.paint_blue("|")));
    }

    fn paint_red(&self, text: &str) -> String {
        if self.use_color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_red_bold(&self, text: &str) -> String {
        if self.use_color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_yellow_bold(&self, text: &str) -> String {
        if self.use_color {
            text.yellow().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_blue(&self, text: &str) -> String {
        if self.use_color {
            text.blue().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_bold(&self, text: &str) -> String {
        if self.use_color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn render_diagnostics(
    source: &str,
    file_name: &str,
    diagnostics: &[Diagnostic],
    use_color: bool,
) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();

    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }

    let errors = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .count();
    if errors > 0 {
        output.push_str(&format!(
            "error: aborting due to {} error{}\n",
            errors,
            if errors == 1 { "" } else { "s" }
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "( a = 5 )\n( a ! )";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 2), (1, 3));
        assert_eq!(line_col(source, 10), (2, 1));
        assert_eq!(line_col(source, 12), (2, 3));
    }

    #[test]
    fn test_render_with_span() {
        let source = "( a = bogus )\n";
        let diagnostic = Diagnostic::error("something went wrong")
            .with_code("E0001")
            .with_label(Label::new(Span::new(6, 11), "here"));

        let renderer = DiagnosticRenderer::new(source, "script.lk", false);
        let output = renderer.render(&diagnostic);

        assert!(output.contains("error[E0001]: something went wrong"));
        assert!(output.contains("script.lk:1:7"));
        assert!(output.contains("^^^^^"));
        assert!(output.contains("here"));
    }

    #[test]
    fn test_dummy_span_renders_header_only() {
        let diagnostic = Diagnostic::error("fatal condition")
            .with_code("E0201")
            .with_label(Label::new(Span::dummy(), ""));

        let renderer = DiagnosticRenderer::new("source", "script.lk", false);
        let output = renderer.render(&diagnostic);

        assert!(output.contains("error[E0201]: fatal condition"));
        assert!(!output.contains("-->"));
    }

    #[test]
    fn test_summary_counts_errors() {
        let diagnostics = vec![
            Diagnostic::error("first"),
            Diagnostic::error("second"),
            Diagnostic::warning("meh"),
        ];
        let output = render_diagnostics("", "script.lk", &diagnostics, false);
        assert!(output.contains("aborting due to 2 errors"));
    }
}
