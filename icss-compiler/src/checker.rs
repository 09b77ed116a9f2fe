use tracing::{debug, trace};

use crate::ast::{Ast, Literal, NodeId, NodeKind, Operator};
use crate::environment::Environment;
use crate::scope::ScopeTracker;
use crate::types::ExpressionType;

const UNDECLARED_VARIABLE: &str = "Variable is not declared.";
const OUT_OF_SCOPE: &str = "Scope error: variable not defined in current scope.";
const COLOR_OPERAND: &str = "TypeError: Cannot operate on a color literal";
const DISTINCT_OPERANDS: &str = "TypeError: Cannot add or subtract with distinct literals.";
const MULTIPLY_WITHOUT_SCALAR: &str = "TypeError: Cannot multiply with only non scalars";
const COLOR_PROPERTY: &str =
    "Color/background-color property must be assigned by a color literal.";
const SIZE_PROPERTY: &str = "Width/height property must be assigned with a pixel literal.";
const CONDITION_NOT_BOOL_VARIABLE: &str = "Variable reference must be of type boolean.";
const CONDITION_IS_OPERATION: &str = "Conditional expression cannot be calculated.";
const CONDITION_NOT_BOOL: &str = "Conditional expression must be a boolean.";

/// Semantic validation pass.
///
/// Walks the tree once, depth-first and pre-order, and attaches a message to every node that
/// violates a rule. Nothing aborts the walk; callers inspect [`Ast::has_errors`] afterwards.
pub struct Checker {
    types: Environment<ExpressionType>,
    scopes: ScopeTracker,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        Self {
            types: Environment::new(),
            scopes: ScopeTracker::new(),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn check(&mut self, ast: &mut Ast) {
        self.types = Environment::new();
        self.scopes = ScopeTracker::new();
        let root = ast.root();
        self.check_node(ast, root);
        debug!(
            error_nodes = ast.error_nodes().len(),
            scopes = self.scopes.scope_count(),
            "semantic check complete"
        );
    }

    fn check_node(&mut self, ast: &mut Ast, id: NodeId) {
        self.record_assignment_type(ast, id);

        self.check_reference_declared(ast, id);
        self.check_operation(ast, id);
        self.check_declaration(ast, id);
        self.check_if_clause(ast, id);

        self.check_scope(ast, id);

        let children = ast.children(id).to_vec();
        for child in children {
            self.check_node(ast, child);
        }

        if ast.kind(id).opens_scope() {
            self.scopes.leave();
        }
    }

    /// Resolve the type of an expression against the assignments visited so far.
    ///
    /// A reference with no recorded type is marked undeclared and typed `Undefined`.
    pub fn type_of(&self, ast: &mut Ast, expression: NodeId) -> ExpressionType {
        match ast.kind(expression) {
            NodeKind::Literal(literal) => literal.expression_type(),
            NodeKind::VariableReference(name) => match self.types.lookup(name) {
                Some(ty) => *ty,
                None => {
                    ast.set_error(expression, UNDECLARED_VARIABLE);
                    ExpressionType::Undefined
                }
            },
            NodeKind::Operation(_) => {
                let (Some(lhs), Some(rhs)) = (ast.child(expression, 0), ast.child(expression, 1))
                else {
                    return ExpressionType::Undefined;
                };
                let lhs = self.type_of(ast, lhs);
                let rhs = self.type_of(ast, rhs);
                ExpressionType::combine(lhs, rhs)
            }
            _ => ExpressionType::Undefined,
        }
    }

    fn record_assignment_type(&mut self, ast: &mut Ast, id: NodeId) {
        if !matches!(ast.kind(id), NodeKind::VariableAssignment) {
            return;
        }
        let Some(name) = ast.assignment_name(id).map(str::to_string) else {
            return;
        };
        let ty = match ast.child(id, 1) {
            Some(value) => self.type_of(ast, value),
            None => ExpressionType::Undefined,
        };
        trace!(variable = %name, ty = ty.describe(), "recorded variable type");
        self.types.record(name, ty);
    }

    fn check_reference_declared(&mut self, ast: &mut Ast, id: NodeId) {
        if let NodeKind::VariableReference(name) = ast.kind(id) {
            if !self.types.contains(name) {
                ast.set_error(id, UNDECLARED_VARIABLE);
            }
        }
    }

    fn check_operation(&mut self, ast: &mut Ast, id: NodeId) {
        let NodeKind::Operation(operator) = *ast.kind(id) else {
            return;
        };
        let (Some(lhs), Some(rhs)) = (ast.child(id, 0), ast.child(id, 1)) else {
            return;
        };

        if is_color_literal(ast, lhs) || is_color_literal(ast, rhs) {
            ast.set_error(id, COLOR_OPERAND);
        }

        let lhs_type = self.type_of(ast, lhs);
        let rhs_type = self.type_of(ast, rhs);
        match operator {
            Operator::Add | Operator::Subtract => {
                if lhs_type != rhs_type {
                    ast.set_error(id, DISTINCT_OPERANDS);
                }
            }
            Operator::Multiply => {
                if !lhs_type.is_scalar() && !rhs_type.is_scalar() {
                    ast.set_error(id, MULTIPLY_WITHOUT_SCALAR);
                }
            }
        }
    }

    fn check_declaration(&mut self, ast: &mut Ast, id: NodeId) {
        if !matches!(ast.kind(id), NodeKind::Declaration) {
            return;
        }
        let (Some(property), Some(value)) = (ast.child(id, 0), ast.child(id, 1)) else {
            return;
        };
        let (requires_color, requires_pixel) = match ast.kind(property) {
            NodeKind::PropertyName(name) => (
                matches!(name.as_str(), "color" | "background-color"),
                matches!(name.as_str(), "width" | "height"),
            ),
            _ => return,
        };

        let ty = self.type_of(ast, value);
        if requires_color && ty != ExpressionType::Color {
            ast.set_error(id, COLOR_PROPERTY);
        }
        if requires_pixel && ty != ExpressionType::Pixel {
            ast.set_error(id, SIZE_PROPERTY);
        }
    }

    fn check_if_clause(&mut self, ast: &mut Ast, id: NodeId) {
        if !matches!(ast.kind(id), NodeKind::IfClause) {
            return;
        }
        let Some(condition) = ast.child(id, 0) else {
            ast.set_error(id, CONDITION_NOT_BOOL);
            return;
        };

        let message = match ast.kind(condition) {
            NodeKind::Literal(Literal::Bool(_)) => None,
            // An undeclared reference is reported on the reference itself.
            NodeKind::VariableReference(name) => match self.types.lookup(name) {
                Some(ExpressionType::Bool) | None => None,
                Some(_) => Some(CONDITION_NOT_BOOL_VARIABLE),
            },
            NodeKind::Operation(_) => Some(CONDITION_IS_OPERATION),
            _ => Some(CONDITION_NOT_BOOL),
        };
        if let Some(message) = message {
            ast.set_error(id, message);
        }
    }

    fn check_scope(&mut self, ast: &mut Ast, id: NodeId) {
        if ast.kind(id).opens_scope() {
            self.scopes.enter();
        }

        match ast.kind(id) {
            NodeKind::VariableAssignment => {
                if let Some(name) = ast.assignment_name(id).map(str::to_string) {
                    self.scopes.register(name, id);
                }
            }
            NodeKind::VariableReference(name) => {
                if self.scopes.resolve(name).is_none() {
                    ast.set_error(id, OUT_OF_SCOPE);
                }
            }
            _ => {}
        }
    }
}

fn is_color_literal(ast: &Ast, operand: NodeId) -> bool {
    matches!(ast.literal(operand), Some(Literal::Color(_)))
}
