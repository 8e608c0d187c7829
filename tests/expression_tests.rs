//! Expression engine tests

use fluent::ast::{Ast, Rule};
use fluent::lexer::lex;
use fluent::parser::{ParseError, parse_expression, parse_type};
use pretty_assertions::assert_eq;

fn expr(source: &str) -> Ast {
    let tokens = lex(source, "expr.fl").unwrap();
    parse_expression(&tokens).unwrap()
}

fn expr_error(source: &str) -> ParseError {
    let tokens = lex(source, "expr.fl").unwrap();
    parse_expression(&tokens).unwrap_err()
}

fn sexp(node: &Ast) -> String {
    let mut out = format!("({}", node.rule);
    if let Some(value) = &node.value {
        out.push_str(&format!(" {value:?}"));
    }
    for child in &node.children {
        out.push(' ');
        out.push_str(&sexp(child));
    }
    out.push(')');
    out
}

// ==================== OPERATOR CHAINS ====================

#[test]
fn test_arithmetic_is_flat() {
    assert_eq!(
        sexp(&expr("a * b + c")),
        concat!(
            r#"(expression (arithmetic-expression (expression (identifier "a")) "#,
            r#"(arithmetic-sign "*") (expression (identifier "b")) "#,
            r#"(arithmetic-sign "+") (expression (identifier "c"))))"#,
        )
    );
}

#[test]
fn test_or_binds_loosest() {
    assert_eq!(
        sexp(&expr("a || b && c")),
        concat!(
            r#"(expression (boolean-expression (expression (identifier "a")) "#,
            r#"(boolean-operator "||") "#,
            r#"(expression (boolean-expression (expression (identifier "b")) "#,
            r#"(boolean-operator "&&") (expression (identifier "c"))))))"#,
        )
    );
}

#[test]
fn test_comparison_over_arithmetic() {
    let ast = expr("x + 1 >= y");
    let chain = &ast.children[0];
    assert_eq!(chain.rule, Rule::BooleanExpression);
    assert_eq!(chain.children[1].value(), Some(">="));
    assert_eq!(
        chain.children[0].children[0].rule,
        Rule::ArithmeticExpression
    );
}

#[test]
fn test_negation() {
    assert_eq!(
        sexp(&expr("!done")),
        r#"(expression (boolean-expression (boolean-operator "!") (expression (identifier "done"))))"#
    );
    assert_eq!(
        sexp(&expr("a == !b")),
        concat!(
            r#"(expression (boolean-expression (expression (identifier "a")) "#,
            r#"(boolean-operator "==") (boolean-operator "!") (expression (identifier "b"))))"#,
        )
    );
}

#[test]
fn test_negation_covers_arithmetic_operand() {
    let ast = expr("!a + b");
    let chain = &ast.children[0];
    assert_eq!(chain.rule, Rule::BooleanExpression);
    assert_eq!(chain.children.len(), 2);
    assert_eq!(
        chain.children[1].children[0].rule,
        Rule::ArithmeticExpression
    );
}

#[test]
fn test_operators_alternate_with_operands() {
    let ast = expr("a - b / c * d + e");
    let chain = &ast.children[0];
    for (i, child) in chain.children.iter().enumerate() {
        let expected = if i % 2 == 0 {
            Rule::Expression
        } else {
            Rule::ArithmeticSign
        };
        assert_eq!(child.rule, expected);
    }
    assert_eq!(chain.children.len(), 9);
}

// ==================== PARENTHESES ====================

#[test]
fn test_parentheses_are_transparent() {
    let plain = expr("a + b");
    assert!(expr("(a + b)").same_shape(&plain));
    assert!(expr("(((a + b)))").same_shape(&plain));
    assert!(expr("(x)").same_shape(&expr("x")));
}

#[test]
fn test_parenthesised_operand() {
    assert_eq!(
        sexp(&expr("(a + b) * c")),
        concat!(
            "(expression (arithmetic-expression ",
            r#"(expression (arithmetic-expression (expression (identifier "a")) "#,
            r#"(arithmetic-sign "+") (expression (identifier "b")))) "#,
            r#"(arithmetic-sign "*") (expression (identifier "c"))))"#,
        )
    );
}

// ==================== PRIMARIES ====================

#[test]
fn test_literals() {
    assert_eq!(sexp(&expr("42")), r#"(expression (number-literal "42"))"#);
    assert_eq!(sexp(&expr("4.5")), r#"(expression (decimal-literal "4.5"))"#);
    assert_eq!(sexp(&expr("false")), r#"(expression (boolean-literal "false"))"#);
    assert_eq!(sexp(&expr(r#""hi""#)), r#"(expression (string-literal "hi"))"#);
}

#[test]
fn test_prefixes() {
    assert_eq!(
        sexp(&expr("*p")),
        r#"(expression (dereference "*") (identifier "p"))"#
    );
    assert_eq!(
        sexp(&expr("&&x")),
        r#"(expression (pointer "&") (pointer "&") (identifier "x"))"#
    );
    assert_eq!(
        sexp(&expr("*a * *b")),
        concat!(
            r#"(expression (arithmetic-expression (expression (dereference "*") (identifier "a")) "#,
            r#"(arithmetic-sign "*") (expression (dereference "*") (identifier "b"))))"#,
        )
    );
}

#[test]
fn test_function_call() {
    assert_eq!(
        sexp(&expr("f()")),
        r#"(expression (function-call (identifier "f")))"#
    );
    assert_eq!(
        sexp(&expr("max(a < b, g(c))")),
        concat!(
            r#"(expression (function-call (identifier "max") (parameters "#,
            r#"(expression (boolean-expression (expression (identifier "a")) "#,
            r#"(boolean-operator "<") (expression (identifier "b")))) "#,
            r#"(expression (function-call (identifier "g") (parameters (expression (identifier "c"))))))))"#,
        )
    );
}

#[test]
fn test_object_creation() {
    assert_eq!(
        sexp(&expr("new List<num>(1, 2)")),
        concat!(
            r#"(expression (object-creation (identifier "List") "#,
            r#"(generics (type (primitive "num"))) "#,
            r#"(parameters (expression (number-literal "1")) (expression (number-literal "2")))))"#,
        )
    );
    assert_eq!(
        sexp(&expr("new Map<>()")),
        r#"(expression (object-creation (identifier "Map") (generics (inferred-type))))"#
    );
    assert_eq!(
        sexp(&expr("new Point(x)")),
        r#"(expression (object-creation (identifier "Point") (parameters (expression (identifier "x")))))"#
    );
}

#[test]
fn test_creation_generics_are_not_comparisons() {
    let ast = expr("new Pair<num, str>(1, \"a\") == p");
    let chain = &ast.children[0];
    assert_eq!(chain.rule, Rule::BooleanExpression);
    assert_eq!(chain.children.len(), 3);
    let creation = &chain.children[0].children[0];
    assert_eq!(creation.rule, Rule::ObjectCreation);
    assert_eq!(creation.child(Rule::Generics).unwrap().children.len(), 2);
}

#[test]
fn test_array_literal() {
    assert_eq!(
        sexp(&expr("[1, x + 1]")),
        concat!(
            r#"(expression (array (expression (number-literal "1")) "#,
            r#"(expression (arithmetic-expression (expression (identifier "x")) "#,
            r#"(arithmetic-sign "+") (expression (number-literal "1"))))))"#,
        )
    );
    assert_eq!(sexp(&expr("[]")), "(expression (array))");
}

// ==================== PROPERTY ACCESS ====================

#[test]
fn test_property_access_chain() {
    assert_eq!(
        sexp(&expr("a.b(1).c")),
        concat!(
            r#"(expression (property-access (expression (identifier "a")) "#,
            r#"(expression (function-call (identifier "b") (parameters (expression (number-literal "1"))))) "#,
            r#"(expression (identifier "c"))))"#,
        )
    );
}

#[test]
fn test_property_access_on_group() {
    assert_eq!(
        sexp(&expr("(a + b).len")),
        concat!(
            "(expression (property-access ",
            r#"(expression (expression (arithmetic-expression (expression (identifier "a")) "#,
            r#"(arithmetic-sign "+") (expression (identifier "b"))))) "#,
            r#"(expression (identifier "len"))))"#,
        )
    );
}

#[test]
fn test_property_access_parenthesised_segment() {
    assert_eq!(
        sexp(&expr("a.(b).c")),
        concat!(
            r#"(expression (property-access (expression (identifier "a")) "#,
            r#"(expression (expression (identifier "b"))) "#,
            r#"(expression (identifier "c"))))"#,
        )
    );
    assert!(expr("a.((b)).c").same_shape(&expr("a.(b).c")));
}

#[test]
fn test_property_access_segments_start_with_primary() {
    let cases = [
        ("list.first().name.chars(0)", 4),
        ("(*p).next.(a + b)", 3),
        ("new Point(1, 2).x", 2),
        ("(1).x", 2),
    ];
    for (source, segments) in cases {
        let ast = expr(source);
        let access = &ast.children[0];
        assert_eq!(access.rule, Rule::PropertyAccess, "{source}");
        assert_eq!(access.children.len(), segments, "{source}");
        for segment in &access.children {
            assert_eq!(segment.rule, Rule::Expression);
            assert_eq!(segment.children.len(), 1, "{source}: {}", sexp(segment));
            assert!(matches!(
                segment.children[0].rule,
                Rule::Identifier | Rule::FunctionCall | Rule::ObjectCreation | Rule::Expression
            ));
        }
    }
}

// ==================== TYPES ====================

#[test]
fn test_nested_generic_type() {
    let tokens = lex("&Map<str, List<num[]>>[]", "t.fl").unwrap();
    let ty = parse_type(&tokens).unwrap();
    assert_eq!(
        sexp(&ty),
        concat!(
            r#"(type (pointer "&") (identifier "Map" (type (primitive "str")) "#,
            r#"(type (identifier "List" (type (primitive "num") (array-type))))) (array-type))"#,
        )
    );
}

// ==================== ERRORS ====================

#[test]
fn test_error_empty_group() {
    let err = expr_error("()");
    assert_eq!(err.expected, vec![Rule::Expression]);
    assert_eq!(err.position.column, 2);
}

#[test]
fn test_error_juxtaposed_operands() {
    let err = expr_error("a b");
    assert_eq!(err.expected, vec![Rule::PropertyAccess]);
    assert_eq!(err.position.column, 3);
}

#[test]
fn test_error_dangling_operator() {
    let err = expr_error("a +");
    assert_eq!(err.expected, vec![Rule::Expression]);
    assert_eq!(err.position.column, 3);
}

#[test]
fn test_error_property_on_literal() {
    let err = expr_error(r#""s".len"#);
    assert_eq!(err.expected, vec![Rule::PropertyAccess]);
    assert_eq!(err.position.column, 1);
}

#[test]
fn test_error_bad_property_segment() {
    let err = expr_error("a.1");
    assert_eq!(err.expected, vec![Rule::PropertyAccess]);
    assert_eq!(err.position.column, 3);
}

#[test]
fn test_error_trailing_after_array() {
    assert!(expr_error("[1, 2] x").expects(Rule::Expression));
}

#[test]
fn test_error_empty_argument() {
    assert!(expr_error("f(a,)").expects(Rule::Expression));
    assert!(expr_error("f(,a)").expects(Rule::Expression));
}

#[test]
fn test_error_no_tokens() {
    let err = parse_expression(&[]).unwrap_err();
    assert_eq!(err.expected, vec![Rule::Expression]);
    assert_eq!(err.position.line, 1);
}

// ==================== DEPTH ====================

#[test]
fn test_deep_parentheses() {
    let depth = 2_000;
    let source = format!("{}a + b{}", "(".repeat(depth), ")".repeat(depth));
    assert!(expr(&source).same_shape(&expr("a + b")));
}

#[test]
fn test_deep_right_nested_arithmetic() {
    let depth = 1_000;
    let source = format!("{}x{}", "x + (".repeat(depth), ")".repeat(depth));
    let ast = expr(&source);
    let chains = ast
        .walk()
        .filter(|n| n.rule == Rule::ArithmeticExpression)
        .count();
    assert_eq!(chains, depth);
}
