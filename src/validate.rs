use crate::ast::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Dotted identifier paths: `this`, `name`, `@index`, `user.first-name`, `items.0`.
static PATH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@?[A-Za-z_$][\w$-]*(\.[\w$-]+)*$").expect("valid path regex"));

/// A problem found in a compiled template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub message: String,
    /// Location in the template, e.g. `["templates", "0", "statements", "2"]`.
    pub path: Vec<String>,
    /// Machine-readable error code.
    pub code: &'static str,
}

/// Check paths, attribute names and nested template ids, recursing into
/// nested templates. Returns an empty vec for a well-formed template.
pub fn validate_template(template: &Template) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    walk_template(template, &mut path, &mut errors);
    errors
}

pub fn is_valid_path(path: &str) -> bool {
    PATH_PATTERN.is_match(path)
}

fn walk_template(template: &Template, path: &mut Vec<String>, errors: &mut Vec<ValidationError>) {
    for (i, node) in template.statements.iter().enumerate() {
        path.push("statements".to_string());
        path.push(i.to_string());
        match node {
            Node::Expr(expr) => check_expr(expr, path, errors),
            Node::Statement(statement) => check_statement(statement, template, path, errors),
        }
        path.truncate(path.len() - 2);
    }
    for (i, nested) in template.templates.iter().enumerate() {
        path.push("templates".to_string());
        path.push(i.to_string());
        walk_template(nested, path, errors);
        path.truncate(path.len() - 2);
    }
}

fn check_statement(
    statement: &Statement,
    template: &Template,
    path: &[String],
    errors: &mut Vec<ValidationError>,
) {
    match statement {
        Statement::Block(node) => {
            check_path(&node.path, path, errors);
            check_args(&node.params, &node.hash, path, errors);
            check_template_id(node.template_id, template, path, errors);
            check_template_id(node.inverse_id, template, path, errors);
        }
        Statement::Inline(node) => {
            check_path(&node.path, path, errors);
            check_args(&node.params, &node.hash, path, errors);
        }
        Statement::Content(node) => check_path(&node.path, path, errors),
        Statement::Element(node) => {
            check_path(&node.path, path, errors);
            check_args(&node.params, &node.hash, path, errors);
        }
        Statement::Attribute(node) => {
            if node.name.is_empty() {
                errors.push(ValidationError {
                    message: "Attribute name is empty".to_string(),
                    path: path.to_vec(),
                    code: "invalid-attribute-name",
                });
            }
            check_expr(&node.value, path, errors);
        }
        Statement::Component(node) => {
            check_path(&node.path, path, errors);
            check_args(&[], &node.attrs, path, errors);
            check_template_id(node.template_id, template, path, errors);
        }
    }
}

fn check_args(params: &[Expr], hash: &HashPairs, path: &[String], errors: &mut Vec<ValidationError>) {
    for param in params {
        check_expr(param, path, errors);
    }
    for (_, value) in hash {
        check_expr(value, path, errors);
    }
}

fn check_expr(expr: &Expr, path: &[String], errors: &mut Vec<ValidationError>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Get { path: p } => check_path(p, path, errors),
        Expr::Subexpr {
            path: p,
            params,
            hash,
        } => {
            check_path(p, path, errors);
            check_args(params, hash, path, errors);
        }
        Expr::Concat { parts } => check_args(parts, &HashPairs::new(), path, errors),
    }
}

fn check_path(value: &str, path: &[String], errors: &mut Vec<ValidationError>) {
    if !is_valid_path(value) {
        errors.push(ValidationError {
            message: format!("Invalid path \"{}\"", value),
            path: path.to_vec(),
            code: "invalid-path",
        });
    }
}

fn check_template_id(
    id: Option<usize>,
    template: &Template,
    path: &[String],
    errors: &mut Vec<ValidationError>,
) {
    if let Some(id) = id {
        if id >= template.templates.len() {
            errors.push(ValidationError {
                message: format!(
                    "Template id {} is out of range ({} nested templates)",
                    id,
                    template.templates.len()
                ),
                path: path.to_vec(),
                code: "missing-template",
            });
        }
    }
}
