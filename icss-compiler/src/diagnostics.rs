use crate::ast::{Ast, NodeId, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub level: DiagnosticLevel,
    pub span: Option<SourceSpan>,
    /// Tree node the message was attached to, when it came from semantic analysis.
    pub node: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Collect the messages attached to reachable nodes, in tree pre-order.
    pub fn from_ast(ast: &Ast) -> Self {
        let mut diagnostics = Self::new();
        for id in ast.error_nodes() {
            for message in ast.errors(id) {
                diagnostics.entries.push(Diagnostic {
                    message: message.clone(),
                    level: DiagnosticLevel::Error,
                    span: ast.span(id),
                    node: Some(id),
                });
            }
        }
        diagnostics
    }

    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.push_error_with_span(message, None);
    }

    pub fn push_error_with_span<S: Into<String>>(&mut self, message: S, span: Option<SourceSpan>) {
        self.entries.push(Diagnostic {
            message: message.into(),
            level: DiagnosticLevel::Error,
            span,
            node: None,
        });
    }

    pub fn push_warning_with_span<S: Into<String>>(
        &mut self,
        message: S,
        span: Option<SourceSpan>,
    ) {
        self.entries.push(Diagnostic {
            message: message.into(),
            level: DiagnosticLevel::Warning,
            span,
            node: None,
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|diagnostic| diagnostic.level == DiagnosticLevel::Error)
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Error)
            .count()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }
}
