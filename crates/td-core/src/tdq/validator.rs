//! Semantic validation pass over a parsed TDQ AST.
//!
//! Runs after parsing and before evaluation. Collects every problem found
//! rather than stopping at the first — callers surface the whole list.

use super::ast::{Expr, Query, SORT_FIELD_WHITELIST};

/// Issue fields recognized on the left-hand side of a `FieldExpr`.
const ISSUE_FIELDS: &[&str] = &[
    "id", "title", "description", "status", "type", "priority", "points", "assignee",
    "creator", "created", "updated", "closed", "deleted", "epic_id", "parent_id",
];

/// Dotted cross-entity prefixes and the fields each exposes.
const LOG_FIELDS: &[&str] = &["message", "tag", "session_id", "created"];
const COMMENT_FIELDS: &[&str] = &["body", "session_id", "created"];
const HANDOFF_FIELDS: &[&str] = &["version", "session_id", "created"];
const FILE_FIELDS: &[&str] = &["path", "created"];
const EPIC_FIELDS: &[&str] = &["title", "status"];
const NOTE_FIELDS: &[&str] = &["id", "title", "body", "created", "updated", "deleted"];

const STATUS_VALUES: &[&str] = &["open", "in_progress", "blocked", "in_review", "closed"];
const PRIORITY_VALUES: &[&str] = &["P0", "P1", "P2", "P3", "P4"];
const TYPE_VALUES: &[&str] = &["bug", "feature", "task", "epic", "chore"];

const FUNCTION_ARITY: &[(&str, usize)] = &[
    ("has", 1),
    ("is", 1),
    ("any", usize::MAX), // variadic, minimum 2 checked separately
    ("blocks", 1),
    ("blocked_by", 1),
    ("child_of", 1),
    ("descendant_of", 1),
    ("is_ready", 0),
    ("has_open_deps", 0),
    ("rework", 0),
];

fn field_enum_values(field: &str) -> Option<&'static [&'static str]> {
    match field {
        "status" | "epic.status" => Some(STATUS_VALUES),
        "priority" => Some(PRIORITY_VALUES),
        "type" => Some(TYPE_VALUES),
        _ => None,
    }
}

fn known_field(field: &str) -> bool {
    if let Some((prefix, rest)) = field.split_once('.') {
        let allowed = match prefix {
            "log" => LOG_FIELDS,
            "comment" => COMMENT_FIELDS,
            "handoff" => HANDOFF_FIELDS,
            "file" => FILE_FIELDS,
            "epic" => EPIC_FIELDS,
            "note" => NOTE_FIELDS,
            _ => return false,
        };
        return allowed.contains(&rest);
    }
    ISSUE_FIELDS.contains(&field)
}

/// Validate a parsed `Query`, returning every problem found (empty = valid).
pub fn validate(query: &Query) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(expr) = &query.expr {
        validate_expr(expr, &mut errors);
    }
    if let Some(sort) = &query.sort {
        if !SORT_FIELD_WHITELIST.contains(&sort.field.as_str()) {
            errors.push(format!("unknown sort field '{}'", sort.field));
        }
    }
    errors
}

fn validate_expr(expr: &Expr, errors: &mut Vec<String>) {
    match expr {
        Expr::FieldExpr { field, value, .. } => {
            if !known_field(field) {
                errors.push(format!("unknown field '{field}'"));
                return;
            }
            if let Some(allowed) = field_enum_values(field) {
                if let super::ast::Value::Identifier(ident) = value {
                    if !allowed.iter().any(|v| v.eq_ignore_ascii_case(ident)) {
                        errors.push(format!("unknown value '{ident}' for field '{field}'"));
                    }
                }
            }
        }
        Expr::BinaryExpr { left, right, .. } => {
            validate_expr(left, errors);
            validate_expr(right, errors);
        }
        Expr::UnaryExpr { expr } => validate_expr(expr, errors),
        Expr::FunctionCall { name, args } => {
            match FUNCTION_ARITY.iter().find(|(n, _)| *n == name) {
                None => errors.push(format!("unknown function '{name}'")),
                Some((_, arity)) => {
                    if *name == "any" {
                        if args.len() < 2 {
                            errors.push("any() requires at least a field and one value".to_string());
                        }
                    } else if args.len() != *arity {
                        errors.push(format!(
                            "{name}() expects {arity} argument(s), found {}",
                            args.len()
                        ));
                    }
                    if *name == "is" && args.len() == 1 {
                        if let super::ast::Value::Identifier(ident) = &args[0] {
                            if !STATUS_VALUES.iter().any(|v| v.eq_ignore_ascii_case(ident)) {
                                errors.push(format!("unknown status '{ident}' in is()"));
                            }
                        }
                    }
                }
            }
        }
        Expr::TextSearch(_) => {}
    }
}
