use icss_compiler::{Ast, Checker, CompileOptions, Compiler, NodeId, NodeKind, Operator, SourceFile};

fn checked(source: &str) -> Ast {
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut ast = compiler
        .parse(&SourceFile::from_string(source))
        .expect("source should parse");
    Checker::new().check(&mut ast);
    ast
}

fn nodes_matching(ast: &Ast, predicate: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
    ast.descendants(ast.root())
        .into_iter()
        .filter(|&id| predicate(ast.kind(id)))
        .collect()
}

fn first_matching(ast: &Ast, predicate: impl Fn(&NodeKind) -> bool) -> NodeId {
    nodes_matching(ast, predicate)
        .into_iter()
        .next()
        .expect("expected a matching node")
}

fn all_messages(ast: &Ast) -> Vec<String> {
    ast.error_nodes()
        .into_iter()
        .flat_map(|id| ast.errors(id).to_vec())
        .collect()
}

#[test]
fn accepts_pixel_addition_for_width() {
    let ast = checked("a { width: 10px + 5px; }");
    assert!(
        !ast.has_errors(),
        "expected no errors, found {:?}",
        all_messages(&ast)
    );
}

#[test]
fn accepts_color_literals_for_color_properties() {
    let ast = checked("a { color: #ff0000; background-color: #00ff00; }");
    assert!(
        !ast.has_errors(),
        "expected no errors, found {:?}",
        all_messages(&ast)
    );
}

#[test]
fn accepts_color_typed_variable_for_color_property() {
    let ast = checked("Main := #336699; a { color: Main; }");
    assert!(
        !ast.has_errors(),
        "expected no errors, found {:?}",
        all_messages(&ast)
    );
}

#[test]
fn rejects_non_color_value_for_color_property() {
    let ast = checked("a { color: 10px; }");
    let declaration = first_matching(&ast, |kind| matches!(kind, NodeKind::Declaration));
    assert_eq!(
        ast.errors(declaration),
        ["Color/background-color property must be assigned by a color literal."]
    );
}

#[test]
fn rejects_percentage_for_height() {
    let ast = checked("a { height: 50%; }");
    let declaration = first_matching(&ast, |kind| matches!(kind, NodeKind::Declaration));
    assert_eq!(
        ast.errors(declaration),
        ["Width/height property must be assigned with a pixel literal."]
    );
}

#[test]
fn flags_mismatched_addition_and_its_declaration() {
    let ast = checked("a { color: 2 + 3px; }");
    let addition = first_matching(&ast, |kind| {
        matches!(kind, NodeKind::Operation(Operator::Add))
    });
    assert_eq!(
        ast.errors(addition),
        ["TypeError: Cannot add or subtract with distinct literals."]
    );

    let declaration = first_matching(&ast, |kind| matches!(kind, NodeKind::Declaration));
    assert!(
        !ast.errors(declaration).is_empty(),
        "a pixel-typed value cannot satisfy a color property"
    );
    assert!(ast.has_errors());
}

#[test]
fn flags_subtraction_across_units() {
    let ast = checked("a { width: 10px - 5%; }");
    let subtraction = first_matching(&ast, |kind| {
        matches!(kind, NodeKind::Operation(Operator::Subtract))
    });
    assert_eq!(
        ast.errors(subtraction),
        ["TypeError: Cannot add or subtract with distinct literals."]
    );
}

#[test]
fn scalar_multiplication_keeps_the_unit() {
    let ast = checked("a { width: 3 * 10px; height: 10px * 3; }");
    assert!(
        !ast.has_errors(),
        "expected no errors, found {:?}",
        all_messages(&ast)
    );
}

#[test]
fn rejects_multiplication_without_a_scalar() {
    let ast = checked("a { width: 10px * 2px; }");
    let multiplication = first_matching(&ast, |kind| {
        matches!(kind, NodeKind::Operation(Operator::Multiply))
    });
    assert_eq!(
        ast.errors(multiplication),
        ["TypeError: Cannot multiply with only non scalars"]
    );
}

#[test]
fn rejects_color_operands() {
    let ast = checked("a { width: #ff0000 * 2; }");
    let multiplication = first_matching(&ast, |kind| {
        matches!(kind, NodeKind::Operation(Operator::Multiply))
    });
    assert!(
        ast.errors(multiplication)
            .iter()
            .any(|message| message == "TypeError: Cannot operate on a color literal"),
        "found {:?}",
        ast.errors(multiplication)
    );
}

#[test]
fn reports_undeclared_reference_twice_independently() {
    let ast = checked("a { width: Size; }");
    let reference = first_matching(&ast, |kind| {
        matches!(kind, NodeKind::VariableReference(name) if name == "Size")
    });
    assert_eq!(
        ast.errors(reference),
        [
            "Variable is not declared.",
            "Scope error: variable not defined in current scope."
        ]
    );
}

#[test]
fn accepts_boolean_literal_and_boolean_variable_conditions() {
    let ast = checked(
        "Wide := TRUE;
         a {
           if [Wide] { width: 1px; } else { width: 2px; }
           if [FALSE] { height: 1px; }
         }",
    );
    assert!(
        !ast.has_errors(),
        "expected no errors, found {:?}",
        all_messages(&ast)
    );
}

#[test]
fn rejects_non_boolean_variable_condition() {
    let ast = checked("Count := 3; a { if [Count] { width: 1px; } }");
    let if_clause = first_matching(&ast, |kind| matches!(kind, NodeKind::IfClause));
    assert_eq!(
        ast.errors(if_clause),
        ["Variable reference must be of type boolean."]
    );
}

#[test]
fn rejects_operation_as_condition() {
    let ast = checked("a { if [1 + 2] { width: 1px; } }");
    let if_clause = first_matching(&ast, |kind| matches!(kind, NodeKind::IfClause));
    assert_eq!(
        ast.errors(if_clause),
        ["Conditional expression cannot be calculated."]
    );
}

#[test]
fn rejects_non_boolean_literal_condition() {
    let ast = checked("a { if [10px] { width: 1px; } }");
    let if_clause = first_matching(&ast, |kind| matches!(kind, NodeKind::IfClause));
    assert_eq!(
        ast.errors(if_clause),
        ["Conditional expression must be a boolean."]
    );
}

#[test]
fn undeclared_condition_is_reported_on_the_reference_only() {
    let ast = checked("a { if [Missing] { width: 1px; } }");
    let if_clause = first_matching(&ast, |kind| matches!(kind, NodeKind::IfClause));
    assert!(ast.errors(if_clause).is_empty());

    let reference = first_matching(&ast, |kind| {
        matches!(kind, NodeKind::VariableReference(name) if name == "Missing")
    });
    assert!(ast
        .errors(reference)
        .iter()
        .any(|message| message == "Variable is not declared."));
}

#[test]
fn collects_every_error_in_one_pass() {
    let ast = checked(
        "a { color: 1px; }
         b { width: 1px * 2px; }
         c { if [3] { height: Missing; } }",
    );
    let messages = all_messages(&ast);
    for expected in [
        "Color/background-color property must be assigned by a color literal.",
        "TypeError: Cannot multiply with only non scalars",
        "Conditional expression must be a boolean.",
        "Variable is not declared.",
        "Scope error: variable not defined in current scope.",
        "Width/height property must be assigned with a pixel literal.",
    ] {
        assert!(
            messages.iter().any(|message| message == expected),
            "missing {expected:?} in {messages:?}"
        );
    }
}

#[test]
fn type_table_is_chronological_across_stylerules() {
    // The type of `X` is known from an earlier rule, but the assignment is not visible here.
    let ast = checked("a { X := 1px; } b { width: X; }");
    let reference = nodes_matching(&ast, |kind| {
        matches!(kind, NodeKind::VariableReference(name) if name == "X")
    })
    .into_iter()
    .last()
    .expect("reference in second rule");
    assert_eq!(
        ast.errors(reference),
        ["Scope error: variable not defined in current scope."]
    );

    let declaration = first_matching(&ast, |kind| matches!(kind, NodeKind::Declaration));
    assert!(ast.errors(declaration).is_empty());
}

#[test]
fn rerunning_the_checker_does_not_duplicate_messages() {
    let mut ast = checked("a { width: 1%; }");
    Checker::new().check(&mut ast);
    let declaration = first_matching(&ast, |kind| matches!(kind, NodeKind::Declaration));
    assert_eq!(ast.errors(declaration).len(), 1);
}
