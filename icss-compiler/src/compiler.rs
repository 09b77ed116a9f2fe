use anyhow::{bail, Result};
use tracing::debug;

use crate::ast::{Ast, NodeKind, SourceSpan};
use crate::checker::Checker;
use crate::diagnostics::Diagnostics;
use crate::evaluator::Evaluator;
use crate::generator::generate;
use crate::lexer::{Lexer, LexerError, Token};
use crate::parser::Parser;
use crate::source::SourceFile;

/// Properties the language defines; anything else is passed through with a warning.
pub const KNOWN_PROPERTIES: &[&str] = &["color", "background-color", "width", "height"];

#[derive(Debug, Default, Clone)]
pub struct CompileOptions {
    pub dump_tokens: bool,
}

#[derive(Debug)]
pub struct Compilation {
    pub ast: Ast,
    pub css: String,
}

pub struct Compiler {
    diagnostics: Diagnostics,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn tokenize(&mut self, source: &SourceFile) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        match lexer.tokenize() {
            Ok(tokens) => Ok(tokens),
            Err(err) => {
                if let Some(lexer_error) = err.downcast_ref::<LexerError>() {
                    let line = lexer_error.line();
                    let column = lexer_error.column();
                    self.diagnostics.push_error_with_span(
                        lexer_error.message(),
                        Some(SourceSpan::single_point(line, column)),
                    );
                } else {
                    self.diagnostics.push(err.to_string());
                }
                bail!("Lexing failed");
            }
        }
    }

    /// Lex and parse `source` into an unchecked tree.
    pub fn parse(&mut self, source: &SourceFile) -> Result<Ast> {
        let tokens = self.tokenize(source)?;

        if self.options.dump_tokens {
            for token in &tokens {
                println!("{token:?}");
            }
        }

        let mut parser = Parser::new(source, tokens);
        let result = parser.parse();
        self.diagnostics.extend(parser.into_diagnostics());
        result
    }

    /// Parse and semantically check `source`. Fails when any node carries an error; the
    /// messages are available from [`Compiler::diagnostics`].
    #[tracing::instrument(level = "debug", skip_all, fields(path = %source.path.display()))]
    pub fn check(&mut self, source: &SourceFile) -> Result<Ast> {
        let mut ast = self.parse(source)?;
        self.warn_unknown_properties(&ast);

        Checker::new().check(&mut ast);
        let semantic_diagnostics = Diagnostics::from_ast(&ast);
        let error_count = semantic_diagnostics.error_count();
        self.diagnostics.extend(semantic_diagnostics);
        if error_count > 0 {
            debug!(error_count, "semantic analysis rejected stylesheet");
            bail!("Semantic analysis failed with {error_count} error(s)");
        }
        Ok(ast)
    }

    /// Check, evaluate and render `source` to CSS.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %source.path.display()))]
    pub fn compile(&mut self, source: &SourceFile) -> Result<Compilation> {
        let mut ast = self.check(source)?;
        Evaluator::new().evaluate(&mut ast);

        let css = match generate(&ast) {
            Ok(css) => css,
            Err(err) => {
                self.diagnostics
                    .push_error_with_span(err.to_string(), err.span());
                bail!("Code generation failed");
            }
        };
        debug!(bytes = css.len(), "generated stylesheet");

        Ok(Compilation { ast, css })
    }

    fn warn_unknown_properties(&mut self, ast: &Ast) {
        for id in ast.descendants(ast.root()) {
            if let NodeKind::PropertyName(name) = ast.kind(id) {
                if !KNOWN_PROPERTIES.contains(&name.as_str()) {
                    self.diagnostics.push_warning_with_span(
                        format!("unknown property '{name}' is passed through unchecked"),
                        ast.span(id),
                    );
                }
            }
        }
    }
}
