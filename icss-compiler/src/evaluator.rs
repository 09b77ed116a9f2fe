use tracing::{debug, trace};

use crate::ast::{Ast, Literal, NodeId, NodeKind, Operator};
use crate::environment::Environment;
use crate::types::ExpressionType;

/// Reduces a checked tree to selectors and literal-valued declarations.
///
/// Variable references are replaced by the most recently recorded literal for their name,
/// arithmetic is folded bottom-up, assignments are dropped once recorded, and every if/else
/// is replaced in its parent by the body of the branch its condition selects.
///
/// `ancestors` holds the chain of containers above the expression being folded; a folded
/// node is relinked into whichever container is on top, so the replacement always lands in
/// the slot the original node occupied.
pub struct Evaluator {
    values: Environment<Literal>,
    ancestors: Vec<NodeId>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            values: Environment::new(),
            ancestors: Vec::new(),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(&mut self, ast: &mut Ast) {
        self.values = Environment::new();
        self.ancestors.clear();
        let root = ast.root();
        self.evaluate_body(ast, root, 0);
        debug!(variables = self.values.len(), "evaluation complete");
    }

    /// Evaluate the body items of `container` starting at child `first`.
    fn evaluate_body(&mut self, ast: &mut Ast, container: NodeId, first: usize) {
        let mut index = first;
        while let Some(child) = ast.child(container, index) {
            match ast.kind(child) {
                NodeKind::VariableAssignment => {
                    self.evaluate_assignment(ast, child);
                    ast.remove_child_at(container, index);
                }
                NodeKind::IfClause => {
                    let adopted = self.resolve_if_clause(ast, child);
                    let count = adopted.len();
                    ast.splice(container, index, adopted);
                    index += count;
                }
                NodeKind::Declaration => {
                    self.evaluate_declaration(ast, child);
                    index += 1;
                }
                NodeKind::Stylerule => {
                    self.evaluate_body(ast, child, 0);
                    index += 1;
                }
                _ => index += 1,
            }
        }
    }

    fn evaluate_assignment(&mut self, ast: &mut Ast, assignment: NodeId) {
        let Some(value) = ast.child(assignment, 1) else {
            return;
        };
        self.ancestors.push(assignment);
        let value = self.evaluate_expression(ast, value);
        self.ancestors.pop();

        let (Some(name), Some(literal)) = (ast.assignment_name(assignment), ast.literal(value))
        else {
            return;
        };
        trace!(variable = name, value = %literal, "materialized variable");
        self.values.record(name, literal.clone());
    }

    fn evaluate_declaration(&mut self, ast: &mut Ast, declaration: NodeId) {
        let Some(value) = ast.child(declaration, 1) else {
            return;
        };
        self.ancestors.push(declaration);
        self.evaluate_expression(ast, value);
        self.ancestors.pop();
    }

    /// Evaluate an if clause and return the body items that replace it in its parent.
    fn resolve_if_clause(&mut self, ast: &mut Ast, if_clause: NodeId) -> Vec<NodeId> {
        let condition = ast.child(if_clause, 0).map(|condition| {
            self.ancestors.push(if_clause);
            let condition = self.evaluate_expression(ast, condition);
            self.ancestors.pop();
            condition
        });

        self.evaluate_body(ast, if_clause, 1);
        let else_clause = else_clause_of(ast, if_clause);
        if let Some(else_clause) = else_clause {
            self.evaluate_body(ast, else_clause, 0);
        }

        let holds = condition.is_some_and(|condition| self.condition_holds(ast, condition));
        trace!(if_clause = %if_clause, holds, "resolved conditional");
        if holds {
            ast.children(if_clause)
                .iter()
                .skip(1)
                .copied()
                .filter(|&child| Some(child) != else_clause)
                .collect()
        } else {
            else_clause
                .map(|else_clause| ast.children(else_clause).to_vec())
                .unwrap_or_default()
        }
    }

    fn condition_holds(&self, ast: &Ast, condition: NodeId) -> bool {
        match ast.kind(condition) {
            NodeKind::Literal(Literal::Bool(value)) => *value,
            NodeKind::VariableReference(name) => {
                matches!(self.values.lookup(name), Some(Literal::Bool(true)))
            }
            _ => false,
        }
    }

    /// Reduce `expression` as far as its operands allow and return the id now standing in
    /// its place.
    fn evaluate_expression(&mut self, ast: &mut Ast, expression: NodeId) -> NodeId {
        match ast.kind(expression) {
            NodeKind::VariableReference(name) => {
                let Some(value) = self.values.lookup(name).cloned() else {
                    return expression;
                };
                self.replace_with_literal(ast, expression, value)
            }
            NodeKind::Operation(operator) => {
                let operator = *operator;
                let operands = ast.children(expression).to_vec();
                self.ancestors.push(expression);
                for operand in operands {
                    self.evaluate_expression(ast, operand);
                }
                self.ancestors.pop();

                match fold_operation(ast, expression, operator) {
                    Some(value) => self.replace_with_literal(ast, expression, value),
                    None => expression,
                }
            }
            _ => expression,
        }
    }

    fn replace_with_literal(&mut self, ast: &mut Ast, original: NodeId, value: Literal) -> NodeId {
        let span = ast.span(original);
        let literal = ast.add_node(NodeKind::Literal(value), span);
        if let Some(&parent) = self.ancestors.last() {
            ast.replace_child(parent, original, literal);
        }
        literal
    }
}

/// Compute an operation whose operands are both numeric literals.
fn fold_operation(ast: &Ast, operation: NodeId, operator: Operator) -> Option<Literal> {
    let lhs = ast.literal(ast.child(operation, 0)?)?;
    let rhs = ast.literal(ast.child(operation, 1)?)?;
    let ty = ExpressionType::combine(lhs.expression_type(), rhs.expression_type());
    let value = operator.apply(lhs.numeric_value()?, rhs.numeric_value()?);
    trace!(
        operator = operator.symbol(),
        %lhs,
        %rhs,
        result = value,
        ty = ty.describe(),
        "folded operation"
    );
    Literal::with_unit(ty, value)
}

fn else_clause_of(ast: &Ast, if_clause: NodeId) -> Option<NodeId> {
    ast.children(if_clause)
        .last()
        .copied()
        .filter(|&child| matches!(ast.kind(child), NodeKind::ElseClause))
}
