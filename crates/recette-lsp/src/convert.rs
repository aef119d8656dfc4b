//! Conversions between engine types and protocol types.
//!
//! Columns are counted in characters on both sides. For text inside the
//! Basic Multilingual Plane this agrees with the protocol's UTF-16 units.

use recette_core::{LineIndex, Span};
use recette_dsl::{CompletionItem, CompletionKind, Diagnostic, Severity, TextEdit};
use tower_lsp::lsp_types;

pub fn to_position(position: recette_core::Position) -> lsp_types::Position {
    lsp_types::Position {
        line: position.line,
        character: position.character,
    }
}

/// Resolve a protocol position against the document, clamping it inside.
pub fn from_position(index: &LineIndex<'_>, position: lsp_types::Position) -> recette_core::Position {
    index.position(position.line, position.character)
}

pub fn to_range(span: Span) -> lsp_types::Range {
    lsp_types::Range {
        start: to_position(span.start),
        end: to_position(span.end),
    }
}

pub fn to_severity(severity: Severity) -> lsp_types::DiagnosticSeverity {
    match severity {
        Severity::Error => lsp_types::DiagnosticSeverity::ERROR,
        Severity::Warning => lsp_types::DiagnosticSeverity::WARNING,
        Severity::Information => lsp_types::DiagnosticSeverity::INFORMATION,
        Severity::Hint => lsp_types::DiagnosticSeverity::HINT,
    }
}

pub fn to_diagnostic(diagnostic: &Diagnostic) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: to_range(diagnostic.span),
        severity: Some(to_severity(diagnostic.severity)),
        source: Some("recette".into()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

pub fn to_completion_item(item: &CompletionItem) -> lsp_types::CompletionItem {
    let kind = match item.kind {
        CompletionKind::Function => lsp_types::CompletionItemKind::FUNCTION,
        CompletionKind::Operator => lsp_types::CompletionItemKind::OPERATOR,
        CompletionKind::Class => lsp_types::CompletionItemKind::CLASS,
        CompletionKind::Field => lsp_types::CompletionItemKind::FIELD,
    };
    lsp_types::CompletionItem {
        label: item.label.clone(),
        kind: Some(kind),
        ..Default::default()
    }
}

pub fn to_text_edit(edit: &TextEdit) -> lsp_types::TextEdit {
    lsp_types::TextEdit {
        range: to_range(edit.span),
        new_text: edit.new_text.clone(),
    }
}

/// The text covered by `span`.
pub fn slice(text: &str, span: Span) -> String {
    text.chars().skip(span.start.offset).take(span.len()).collect()
}
