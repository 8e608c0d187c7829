//! Parser tests

use fluent::ast::{Ast, Rule};
use fluent::lexer::lex;
use fluent::parser::{ParseError, parse, parse_block};
use pretty_assertions::assert_eq;

fn parse_source(source: &str) -> Ast {
    let tokens = lex(source, "test.fl").unwrap();
    parse(&tokens, "test.fl").unwrap()
}

fn parse_error(source: &str) -> ParseError {
    let tokens = lex(source, "test.fl").unwrap();
    parse(&tokens, "test.fl").unwrap_err()
}

/// One-line `(rule "value" children...)` rendering
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

/// The single statement in the body of `fn main`
fn statement(body: &str) -> String {
    let ast = parse_source(&format!("fn main() {{ {body} }}"));
    let block = ast.children[0].child(Rule::Block).unwrap();
    assert_eq!(block.children.len(), 1, "expected one statement in {body:?}");
    sexp(&block.children[0])
}

// ==================== PROGRAM ====================

#[test]
fn test_parse_empty_program() {
    let ast = parse_source("");
    assert_eq!(ast.rule, Rule::Program);
    assert!(ast.children.is_empty());
    assert_eq!(ast.position.to_string(), "test.fl:1:1");
}

#[test]
fn test_parse_import() {
    let ast = parse_source(r#"import "std";"#);
    assert_eq!(sexp(&ast), r#"(program (import (string-literal "std")))"#);
}

#[test]
fn test_parse_items_in_order() {
    let ast = parse_source(r#"import "a"; fn f() {} mod M {} pub fn g() {}"#);
    let rules: Vec<Rule> = ast.children.iter().map(|c| c.rule).collect();
    assert_eq!(
        rules,
        vec![Rule::Import, Rule::Function, Rule::Module, Rule::Function]
    );
}

#[test]
fn test_parse_function_with_arithmetic() {
    let ast = parse_source("fn main() { let x: num = 2 + 3 * 4; }");
    assert_eq!(
        sexp(&ast.children[0]),
        concat!(
            r#"(function (identifier "main") (parameters) (block "#,
            r#"(declaration (declaration-type "let") (identifier "x") (type (primitive "num")) "#,
            r#"(expression (arithmetic-expression "#,
            r#"(expression (number-literal "2")) (arithmetic-sign "+") "#,
            r#"(expression (number-literal "3")) (arithmetic-sign "*") "#,
            r#"(expression (number-literal "4"))))))"#,
        )
    );
}

#[test]
fn test_parse_condition_with_property_access() {
    let ast = parse_source("fn main() { if a.b.c + 25 == 100 { } }");
    let block = ast.children[0].child(Rule::Block).unwrap();
    assert_eq!(
        sexp(&block.children[0]),
        concat!(
            "(if (expression (boolean-expression ",
            "(expression (arithmetic-expression ",
            "(expression (property-access ",
            r#"(expression (identifier "a")) (expression (identifier "b")) (expression (identifier "c")))) "#,
            r#"(arithmetic-sign "+") (expression (number-literal "25")))) "#,
            r#"(boolean-operator "==") (expression (number-literal "100")))) "#,
            "(block))",
        )
    );
}

#[test]
fn test_parse_for_loop() {
    assert_eq!(
        statement("for 0 to n in i { break; }"),
        concat!(
            r#"(for (expression (number-literal "0")) (expression (identifier "n")) "#,
            r#"(identifier "i") (block (break)))"#,
        )
    );
}

#[test]
fn test_parse_public_generic_module() {
    let ast = parse_source("pub mod M<T> { pub fn f(x: T) -> T { return x; } }");
    assert_eq!(
        sexp(&ast.children[0]),
        concat!(
            r#"(module (public) (identifier "M") (templates (identifier "T")) (block "#,
            r#"(function (public) (identifier "f") "#,
            r#"(parameters (parameter (identifier "x") (type (identifier "T")))) "#,
            r#"(type (identifier "T")) "#,
            r#"(block (return (expression (identifier "x")))))))"#,
        )
    );
}

#[test]
fn test_parse_function_templates() {
    let ast = parse_source("fn map<A, B>(xs: A[], f: &B) -> List<B> {}");
    assert_eq!(
        sexp(&ast.children[0]),
        concat!(
            r#"(function (identifier "map") (templates (identifier "A") (identifier "B")) "#,
            r#"(parameters "#,
            r#"(parameter (identifier "xs") (type (identifier "A") (array-type))) "#,
            r#"(parameter (identifier "f") (type (pointer "&") (identifier "B")))) "#,
            r#"(type (identifier "List" (type (identifier "B")))) "#,
            "(block))",
        )
    );
}

#[test]
fn test_parse_module_members() {
    let ast = parse_source("mod Config { const limit: num = 10; let name: str; fn get() {} }");
    let block = ast.children[0].child(Rule::Block).unwrap();
    let rules: Vec<Rule> = block.children.iter().map(|c| c.rule).collect();
    assert_eq!(
        rules,
        vec![
            Rule::Declaration,
            Rule::IncompleteDeclaration,
            Rule::Function
        ]
    );
    assert_eq!(
        sexp(&block.children[1]),
        r#"(incomplete-declaration (declaration-type "let") (identifier "name") (type (primitive "str")))"#
    );
}

// ==================== STATEMENTS ====================

#[test]
fn test_parse_reassignment() {
    assert_eq!(
        statement("count = count + 1;"),
        concat!(
            r#"(assignment (expression (identifier "count")) "#,
            r#"(expression (arithmetic-expression (expression (identifier "count")) "#,
            r#"(arithmetic-sign "+") (expression (number-literal "1")))))"#,
        )
    );
}

#[test]
fn test_parse_property_reassignment() {
    assert_eq!(
        statement("self.size = 3;"),
        concat!(
            "(assignment (expression (property-access ",
            r#"(expression (identifier "self")) (expression (identifier "size")))) "#,
            r#"(expression (number-literal "3")))"#,
        )
    );
}

#[test]
fn test_parse_expression_statement() {
    assert_eq!(
        statement("print(x);"),
        r#"(expression (function-call (identifier "print") (parameters (expression (identifier "x")))))"#
    );
}

#[test]
fn test_parse_return_without_value() {
    assert_eq!(statement("return;"), "(return)");
    assert_eq!(statement("continue;"), "(continue)");
}

#[test]
fn test_parse_if_else_chain() {
    assert_eq!(
        statement("if a { } else if b { x(); } else { }"),
        concat!(
            r#"(if (expression (identifier "a")) (block) "#,
            r#"(else-if (expression (identifier "b")) (block (expression (function-call (identifier "x"))))) "#,
            "(else (block)))",
        )
    );
}

#[test]
fn test_parse_while_and_nested_block() {
    let ast = parse_source("fn main() { while true { { let y: num = 1; } } }");
    let block = ast.children[0].child(Rule::Block).unwrap();
    assert_eq!(
        sexp(&block.children[0]),
        concat!(
            r#"(while (expression (boolean-literal "true")) (block (block "#,
            r#"(declaration (declaration-type "let") (identifier "y") (type (primitive "num")) "#,
            r#"(expression (number-literal "1"))))))"#,
        )
    );
}

#[test]
fn test_parse_block_statements_keep_order() {
    let ast = parse_source("fn main() { a(); if x { } b(); { } c(); }");
    let block = ast.children[0].child(Rule::Block).unwrap();
    let rules: Vec<Rule> = block.children.iter().map(|c| c.rule).collect();
    assert_eq!(
        rules,
        vec![
            Rule::Expression,
            Rule::If,
            Rule::Expression,
            Rule::Block,
            Rule::Expression
        ]
    );
}

#[test]
fn test_parse_positions() {
    let ast = parse_source("fn main() {\n    let x: num = 1;\n}");
    let function = &ast.children[0];
    assert_eq!(function.position.to_string(), "test.fl:1:1");
    let declaration = &function.child(Rule::Block).unwrap().children[0];
    assert_eq!(declaration.position.to_string(), "test.fl:2:5");
    assert_eq!(declaration.children[1].position.column, 9);
}

#[test]
fn test_parse_block_entry_point() {
    let tokens = lex("Name = \"x\"; go();", "test.fl").unwrap();
    let block = parse_block(&tokens, "test.fl").unwrap();
    assert_eq!(block.rule, Rule::Block);
    assert_eq!(block.children.len(), 2);
    assert_eq!(block.children[0].rule, Rule::Assignment);
}

// ==================== ERRORS ====================

#[test]
fn test_error_declaration_without_type() {
    let err = parse_error("fn main() { let x = 1; }");
    assert_eq!(err.expected, vec![Rule::Declaration]);
    // the `=`
    assert_eq!(err.position.to_string(), "test.fl:1:19");
}

#[test]
fn test_error_unexpected_top_level() {
    let err = parse_error("let x: num = 1;");
    assert_eq!(err.expected, vec![Rule::Import, Rule::Function, Rule::Module]);
    assert_eq!(err.position.column, 1);
    assert_eq!(
        err.to_string(),
        "expected import, function or module at test.fl:1:1"
    );
}

#[test]
fn test_error_missing_semicolon() {
    let err = parse_error("fn main() { x() }");
    assert_eq!(err.expected, vec![Rule::Statement]);
}

#[test]
fn test_error_import_without_path() {
    let err = parse_error("import std;");
    assert_eq!(err.expected, vec![Rule::Import]);
    assert_eq!(err.position.column, 8);
}

#[test]
fn test_error_short_function() {
    let err = parse_error("fn main()");
    assert!(err.expects(Rule::Function));
}

#[test]
fn test_error_else_without_if() {
    let err = parse_error("fn main() { x(); else { } }");
    assert_eq!(err.expected, vec![Rule::If]);
    assert_eq!(err.position.column, 18);
}

#[test]
fn test_error_else_after_separate_statement() {
    let err = parse_error("fn main() { if a { } b(); else { } }");
    assert_eq!(err.expected, vec![Rule::If]);
}

#[test]
fn test_error_value_less_declaration_in_block() {
    let err = parse_error("fn main() { let x: num; }");
    assert_eq!(err.expected, vec![Rule::Declaration]);
    // the `;`
    assert_eq!(err.position.column, 23);
}

#[test]
fn test_error_module_statement() {
    let err = parse_error("mod M { x(); }");
    assert_eq!(
        err.expected,
        vec![
            Rule::Function,
            Rule::Declaration,
            Rule::IncompleteDeclaration
        ]
    );
}

#[test]
fn test_error_bad_parameter() {
    let err = parse_error("fn f(a b) {}");
    assert_eq!(err.expected, vec![Rule::Parameter]);
    assert_eq!(err.position.column, 8);
}

#[test]
fn test_error_assign_to_call() {
    let err = parse_error("fn main() { f() = 1; }");
    assert_eq!(err.expected, vec![Rule::Assignment]);
}

#[test]
fn test_error_unbalanced_braces() {
    let err = parse_error("fn main() { if x { }");
    assert!(err.expects(Rule::Block));
}

#[test]
fn test_error_pointer_to_nothing() {
    let err = parse_error("fn f() -> &nothing {}");
    assert_eq!(err.expected, vec![Rule::Type]);
}

// ==================== DEPTH ====================

#[test]
fn test_deeply_nested_blocks() {
    let depth = 5_000;
    let source = format!("fn main() {{ {}{} }}", "{ ".repeat(depth), "} ".repeat(depth));
    let ast = parse_source(&source);

    let mut node = ast.children[0].child(Rule::Block).unwrap();
    let mut seen = 0;
    while let Some(inner) = node.children.first() {
        node = inner;
        seen += 1;
    }
    assert_eq!(seen, depth);
}

#[test]
fn test_display_deep_tree_on_small_stack() {
    let depth = 5_000;
    let source = format!("fn main() {{ {}{} }}", "{ ".repeat(depth), "} ".repeat(depth));
    let ast = parse_source(&source);

    let rendered = std::thread::Builder::new()
        .stack_size(128 * 1024)
        .spawn(move || ast.to_string())
        .unwrap()
        .join()
        .unwrap();

    assert!(rendered.starts_with("program {\n  function {\n    identifier \"main\"\n"));
    assert!(rendered.ends_with("\n  }\n}"));
    assert_eq!(rendered.lines().count(), 2 * depth + 7);
    assert_eq!(rendered.lines().filter(|l| l.trim() == "block {").count(), depth);
}

#[test]
fn test_deeply_nested_if() {
    let depth = 2_000;
    let source = format!(
        "fn main() {{ {}{} }}",
        "if x { ".repeat(depth),
        "} ".repeat(depth)
    );
    let ast = parse_source(&source);
    assert_eq!(ast.walk().filter(|n| n.rule == Rule::If).count(), depth);
}
