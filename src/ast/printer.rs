//! Canonical source printer
//!
//! Re-emits source from a parsed tree. Nested operator chains are always
//! parenthesised; the parser flattens those parentheses away again, so
//! printing and re-parsing yields a tree of the same shape.

use super::{Ast, Rule};

pub fn print_program(program: &Ast) -> String {
    let mut out = String::new();
    let mut previous: Option<Rule> = None;

    for item in &program.children {
        if let Some(rule) = previous {
            // Imports stay grouped; everything else is spaced out
            if !(rule == Rule::Import && item.rule == Rule::Import) {
                out.push('\n');
            }
        }
        format_item(item, &mut out, 0);
        previous = Some(item.rule);
    }
    out
}

pub fn print_expression(expression: &Ast) -> String {
    let mut out = String::new();
    format_expr(expression, &mut out, false);
    out
}

pub fn print_type(ty: &Ast) -> String {
    let mut out = String::new();
    format_type(ty, &mut out);
    out
}

fn format_item(item: &Ast, out: &mut String, indent: usize) {
    match item.rule {
        Rule::Import => {
            indent_to(out, indent);
            out.push_str("import ");
            if let Some(path) = item.child(Rule::StringLiteral) {
                format_string(path.value().unwrap_or_default(), out);
            }
            out.push_str(";\n");
        }
        Rule::Function => format_function(item, out, indent),
        Rule::Module => {
            indent_to(out, indent);
            if item.child(Rule::Public).is_some() {
                out.push_str("pub ");
            }
            out.push_str("mod ");
            out.push_str(name_of(item));
            if let Some(templates) = item.child(Rule::Templates) {
                format_templates(templates, out);
            }
            out.push(' ');
            match item.child(Rule::Block) {
                Some(block) => format_members(block, out, indent),
                None => out.push_str("{}"),
            }
            out.push('\n');
        }
        _ => format_stmt(item, out, indent),
    }
}

fn format_function(function: &Ast, out: &mut String, indent: usize) {
    indent_to(out, indent);
    if function.child(Rule::Public).is_some() {
        out.push_str("pub ");
    }
    out.push_str("fn ");
    out.push_str(name_of(function));
    if let Some(templates) = function.child(Rule::Templates) {
        format_templates(templates, out);
    }

    out.push('(');
    if let Some(parameters) = function.child(Rule::Parameters) {
        for (idx, parameter) in parameters.children_of(Rule::Parameter).enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            out.push_str(name_of(parameter));
            out.push_str(": ");
            if let Some(ty) = parameter.child(Rule::Type) {
                format_type(ty, out);
            }
        }
    }
    out.push(')');

    if let Some(returns) = function.child(Rule::Type) {
        out.push_str(" -> ");
        format_type(returns, out);
    }
    out.push(' ');
    match function.child(Rule::Block) {
        Some(block) => format_block(block, out, indent),
        None => out.push_str("{}"),
    }
    out.push('\n');
}

fn format_members(block: &Ast, out: &mut String, indent: usize) {
    if block.children.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for (idx, member) in block.children.iter().enumerate() {
        if idx > 0 && member.rule == Rule::Function {
            out.push('\n');
        }
        format_item(member, out, indent + 4);
    }
    indent_to(out, indent);
    out.push('}');
}

fn format_block(block: &Ast, out: &mut String, indent: usize) {
    if block.children.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for stmt in &block.children {
        format_stmt(stmt, out, indent + 4);
    }
    indent_to(out, indent);
    out.push('}');
}

fn format_stmt(stmt: &Ast, out: &mut String, indent: usize) {
    indent_to(out, indent);
    match stmt.rule {
        Rule::Declaration | Rule::IncompleteDeclaration => {
            if let Some(kind) = stmt.child(Rule::DeclarationType) {
                out.push_str(kind.value().unwrap_or("let"));
                out.push(' ');
            }
            out.push_str(name_of(stmt));
            out.push_str(": ");
            if let Some(ty) = stmt.child(Rule::Type) {
                format_type(ty, out);
            }
            if let Some(value) = stmt.child(Rule::Expression) {
                out.push_str(" = ");
                format_expr(value, out, false);
            }
            out.push_str(";\n");
        }
        Rule::Assignment => {
            if let [target, value] = stmt.children.as_slice() {
                format_expr(target, out, false);
                out.push_str(" = ");
                format_expr(value, out, false);
            }
            out.push_str(";\n");
        }
        Rule::Return => {
            out.push_str("return");
            if let Some(value) = stmt.children.first() {
                out.push(' ');
                format_expr(value, out, false);
            }
            out.push_str(";\n");
        }
        Rule::Break => out.push_str("break;\n"),
        Rule::Continue => out.push_str("continue;\n"),
        Rule::Block => {
            format_block(stmt, out, indent);
            out.push('\n');
        }
        Rule::If | Rule::While => {
            format_conditional(stmt, out, indent);
            for branch in &stmt.children {
                match branch.rule {
                    Rule::ElseIf => {
                        out.push_str(" else ");
                        format_conditional(branch, out, indent);
                    }
                    Rule::Else => {
                        out.push_str(" else ");
                        if let Some(block) = branch.child(Rule::Block) {
                            format_block(block, out, indent);
                        }
                    }
                    _ => {}
                }
            }
            out.push('\n');
        }
        Rule::For => {
            out.push_str("for ");
            if let [low, high, name, block] = stmt.children.as_slice() {
                format_expr(low, out, false);
                out.push_str(" to ");
                format_expr(high, out, false);
                out.push_str(" in ");
                out.push_str(name.value().unwrap_or_default());
                out.push(' ');
                format_block(block, out, indent);
            }
            out.push('\n');
        }
        _ => {
            format_expr(stmt, out, false);
            out.push_str(";\n");
        }
    }
}

/// `if cond { ... }`, `else if cond { ... }` or `while cond { ... }`
fn format_conditional(node: &Ast, out: &mut String, indent: usize) {
    out.push_str(match node.rule {
        Rule::While => "while ",
        _ => "if ",
    });
    if let Some(condition) = node.child(Rule::Expression) {
        format_expr(condition, out, false);
    }
    out.push(' ');
    match node.child(Rule::Block) {
        Some(block) => format_block(block, out, indent),
        None => out.push_str("{}"),
    }
}

/// Print an expression node, wrapping operator chains in parentheses when
/// `nested` or when a prefix operator precedes them
fn format_expr(node: &Ast, out: &mut String, nested: bool) {
    if node.rule != Rule::Expression {
        format_term(node, out, nested);
        return;
    }

    for (idx, child) in node.children.iter().enumerate() {
        format_term(child, out, nested || idx > 0);
    }
}

fn format_term(node: &Ast, out: &mut String, nested: bool) {
    match node.rule {
        Rule::Dereference => out.push('*'),
        Rule::Pointer => out.push('&'),
        Rule::BooleanExpression | Rule::ArithmeticExpression => {
            if nested {
                out.push('(');
            }
            format_chain(node, out);
            if nested {
                out.push(')');
            }
        }
        Rule::PropertyAccess => {
            for (idx, segment) in node.children.iter().enumerate() {
                if idx > 0 {
                    out.push('.');
                }
                if is_bare_segment(segment) {
                    format_expr(segment, out, true);
                } else {
                    out.push('(');
                    format_expr(segment, out, false);
                    out.push(')');
                }
            }
        }
        Rule::FunctionCall => {
            out.push_str(name_of(node));
            format_arguments(node, out);
        }
        Rule::ObjectCreation => {
            out.push_str("new ");
            out.push_str(name_of(node));
            if let Some(generics) = node.child(Rule::Generics) {
                out.push('<');
                format_type_list(&generics.children, out);
                out.push('>');
            }
            format_arguments(node, out);
        }
        Rule::Array => {
            out.push('[');
            for (idx, element) in node.children.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                format_expr(element, out, false);
            }
            out.push(']');
        }
        Rule::StringLiteral => format_string(node.value().unwrap_or_default(), out),
        Rule::Expression => {
            out.push('(');
            format_expr(node, out, false);
            out.push(')');
        }
        _ => out.push_str(node.value().unwrap_or_default()),
    }
}

/// Operands and operators separated by spaces; `!` sticks to its operand
fn format_chain(chain: &Ast, out: &mut String) {
    let mut after_negation = false;
    for (idx, child) in chain.children.iter().enumerate() {
        if idx > 0 && !after_negation {
            out.push(' ');
        }
        if child.rule.is_operator() {
            let sign = child.value().unwrap_or_default();
            out.push_str(sign);
            after_negation = sign == "!";
        } else {
            format_expr(child, out, true);
            after_negation = false;
        }
    }
}

/// A segment that prints without parentheses inside a property chain
fn is_bare_segment(segment: &Ast) -> bool {
    matches!(
        segment.children.as_slice(),
        [only] if matches!(
            only.rule,
            Rule::Identifier | Rule::FunctionCall | Rule::ObjectCreation | Rule::Expression
        )
    )
}

fn format_arguments(call: &Ast, out: &mut String) {
    out.push('(');
    if let Some(arguments) = call.child(Rule::Parameters) {
        for (idx, argument) in arguments.children.iter().enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            format_expr(argument, out, false);
        }
    }
    out.push(')');
}

fn format_type(ty: &Ast, out: &mut String) {
    for part in &ty.children {
        match part.rule {
            Rule::Pointer => out.push('&'),
            Rule::ArrayType => out.push_str("[]"),
            Rule::Identifier => {
                out.push_str(part.value().unwrap_or_default());
                if !part.children.is_empty() {
                    out.push('<');
                    format_type_list(&part.children, out);
                    out.push('>');
                }
            }
            _ => out.push_str(part.value().unwrap_or_default()),
        }
    }
}

/// Comma separated types; an inferred type prints as nothing
fn format_type_list(types: &[Ast], out: &mut String) {
    for (idx, ty) in types.iter().enumerate() {
        if ty.rule == Rule::InferredType {
            continue;
        }
        if idx > 0 {
            out.push_str(", ");
        }
        format_type(ty, out);
    }
}

fn format_templates(templates: &Ast, out: &mut String) {
    out.push('<');
    for (idx, name) in templates.children_of(Rule::Identifier).enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        out.push_str(name.value().unwrap_or_default());
    }
    out.push('>');
}

fn format_string(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
}

fn name_of(node: &Ast) -> &str {
    node.child(Rule::Identifier)
        .and_then(Ast::value)
        .unwrap_or_default()
}

fn indent_to(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push(' ');
    }
}
