use ariadne::{Color, Label, Report, ReportKind, Source};
use recette_core::Span;
use std::fmt;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The document is wrong.
    Error,
    /// The document is suspicious.
    Warning,
    /// Something worth knowing.
    Information,
    /// A suggestion.
    Hint,
}

/// A diagnostic message with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious the problem is.
    pub severity: Severity,
    /// The smallest span identifying the offending word or token.
    pub span: Span,
    /// Human-readable description.
    pub message: String,
    /// Optional text for the underline in rendered output.
    pub label: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity,
            span,
            message: message.into(),
            label: None,
        }
    }

    /// An error diagnostic.
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    /// A warning diagnostic.
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, span, message)
    }

    /// An informational diagnostic.
    pub fn information(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Information, span, message)
    }

    /// A hint diagnostic.
    pub fn hint(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Hint, span, message)
    }

    /// Attach an underline label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
        };
        write!(f, "{prefix}: {}", self.message)
    }
}

/// Sort diagnostics by position, then severity. The engine reports them in
/// no particular order; display code calls this first.
pub fn sort_by_position(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(a.span.end.cmp(&b.span.end))
            .then(a.severity.cmp(&b.severity))
    });
}

/// Render diagnostics using ariadne for pretty terminal output.
///
/// Spans are character offsets, which is ariadne's default indexing.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let (kind, color) = match diag.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Information => (ReportKind::Custom("info", Color::Cyan), Color::Cyan),
            Severity::Hint => (ReportKind::Advice, Color::Fixed(147)),
        };

        let span = (filename, diag.span.offsets());
        let mut report = Report::build(kind, span).with_message(&diag.message);

        let label_text = diag.label.as_deref().unwrap_or(&diag.message);
        report = report.with_label(
            Label::new((filename, diag.span.offsets()))
                .with_message(label_text)
                .with_color(color),
        );

        report
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}
