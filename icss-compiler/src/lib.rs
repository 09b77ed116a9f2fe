mod ast;
mod checker;
mod compiler;
mod diagnostics;
mod environment;
mod evaluator;
mod generator;
mod lexer;
mod parser;
mod scope;
mod source;
mod types;

pub use crate::ast::{Ast, Literal, Node, NodeId, NodeKind, Operator, Selector, SourceSpan};
pub use crate::checker::Checker;
pub use crate::compiler::{Compilation, CompileOptions, Compiler, KNOWN_PROPERTIES};
pub use crate::diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use crate::environment::Environment;
pub use crate::evaluator::Evaluator;
pub use crate::generator::{generate, GenerateError};
pub use crate::lexer::{Keyword, Lexer, LexerError, Token, TokenKind};
pub use crate::parser::{Parser, MAX_NESTING_DEPTH};
pub use crate::scope::{ScopeId, ScopeTracker};
pub use crate::source::SourceFile;
pub use crate::types::ExpressionType;
