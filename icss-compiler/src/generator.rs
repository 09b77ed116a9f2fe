use std::fmt::Write as _;

use thiserror::Error;

use crate::ast::{Ast, NodeId, NodeKind, SourceSpan};

#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("cannot render unresolved {kind} node")]
    Unresolved {
        kind: &'static str,
        span: Option<SourceSpan>,
    },
    #[error("declaration is missing its {part}")]
    IncompleteDeclaration {
        part: &'static str,
        span: Option<SourceSpan>,
    },
}

impl GenerateError {
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            GenerateError::Unresolved { span, .. }
            | GenerateError::IncompleteDeclaration { span, .. } => *span,
        }
    }
}

/// Render a fully evaluated stylesheet as CSS.
///
/// Each stylerule becomes `selectors { property: value; ... }` with two-space indented
/// declarations, in source order.
pub fn generate(ast: &Ast) -> Result<String, GenerateError> {
    let mut output = String::new();
    for &child in ast.children(ast.root()) {
        match ast.kind(child) {
            NodeKind::Stylerule => write_stylerule(ast, child, &mut output)?,
            other => return Err(unresolved(ast, child, other)),
        }
    }
    Ok(output)
}

fn write_stylerule(ast: &Ast, rule: NodeId, output: &mut String) -> Result<(), GenerateError> {
    let selectors = ast
        .children(rule)
        .iter()
        .filter_map(|&child| match ast.kind(child) {
            NodeKind::Selector(selector) => Some(selector.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(output, "{selectors} {{");

    for &child in ast.children(rule) {
        match ast.kind(child) {
            NodeKind::Selector(_) => {}
            NodeKind::Declaration => write_declaration(ast, child, output)?,
            other => return Err(unresolved(ast, child, other)),
        }
    }

    output.push_str("}\n");
    Ok(())
}

fn write_declaration(
    ast: &Ast,
    declaration: NodeId,
    output: &mut String,
) -> Result<(), GenerateError> {
    let span = ast.span(declaration);
    let property = match ast.child(declaration, 0).map(|id| ast.kind(id)) {
        Some(NodeKind::PropertyName(name)) => name,
        _ => {
            return Err(GenerateError::IncompleteDeclaration {
                part: "property name",
                span,
            })
        }
    };
    let value = ast
        .child(declaration, 1)
        .ok_or(GenerateError::IncompleteDeclaration {
            part: "value",
            span,
        })?;
    let literal = ast
        .literal(value)
        .ok_or_else(|| unresolved(ast, value, ast.kind(value)))?;

    let _ = writeln!(output, "  {property}: {literal};");
    Ok(())
}

fn unresolved(ast: &Ast, id: NodeId, kind: &NodeKind) -> GenerateError {
    GenerateError::Unresolved {
        kind: kind.label(),
        span: ast.span(id),
    }
}
