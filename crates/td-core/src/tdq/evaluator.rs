//! TDQ evaluator.
//!
//! Consults the store once for a candidate row set, then applies an
//! in-memory matcher derived from the AST. Sort is insertion sort
//! (adequate for the documented ≤few-hundred-result scale) applied after
//! matching.

use super::ast::{BoolOp, CompareOp, Expr, Query, SortDirection, SpecialKind, Value};
use crate::dependency::{is_rework, DependencyIndex};
use crate::error::{TdError, TdResult};
use crate::schema::{Issue, IssuePriority, IssueType, Note};
use crate::store::Store;
use chrono::{DateTime, Datelike, Duration, Utc};

/// Resolves `@me`, "current session", and "now" for one evaluation pass.
pub struct EvalContext<'a> {
    pub store: &'a Store,
    pub current_session: &'a str,
    pub now: DateTime<Utc>,
    deps: DependencyIndex,
}

impl<'a> EvalContext<'a> {
    pub fn new(store: &'a Store, current_session: &'a str, now: DateTime<Utc>) -> TdResult<Self> {
        let deps = DependencyIndex::build(store)?;
        Ok(Self {
            store,
            current_session,
            now,
            deps,
        })
    }
}

/// Run an issue query: fetch the candidate set (bounded by `max_results`),
/// filter with the parsed expression, sort, and return the final page.
pub fn query_issues(ctx: &EvalContext, query: &Query, max_results: usize) -> TdResult<Vec<Issue>> {
    let mut candidates = ctx.store.list_issues(false)?;
    if candidates.len() > max_results {
        candidates.truncate(max_results);
    }

    let matched: Vec<Issue> = match &query.expr {
        None => candidates,
        Some(expr) => {
            let mut out = Vec::new();
            for issue in candidates {
                if eval_issue_expr(expr, &issue, ctx)? {
                    out.push(issue);
                }
            }
            out
        }
    };

    let mut sorted = matched;
    if let Some(sort) = &query.sort {
        insertion_sort(&mut sorted, |a, b| compare_issue_field(a, b, &sort.field));
        if sort.direction == SortDirection::Desc {
            sorted.reverse();
        }
    }
    Ok(sorted)
}

/// Run a note query (routed here whenever the AST contains a `note.*`
/// field).
pub fn query_notes(ctx: &EvalContext, query: &Query, max_results: usize) -> TdResult<Vec<Note>> {
    let mut candidates = ctx.store.list_notes(false)?;
    if candidates.len() > max_results {
        candidates.truncate(max_results);
    }

    let matched: Vec<Note> = match &query.expr {
        None => candidates,
        Some(expr) => candidates
            .drain(..)
            .filter(|note| eval_note_expr(expr, note))
            .collect(),
    };

    let mut sorted = matched;
    if let Some(sort) = &query.sort {
        insertion_sort(&mut sorted, |a, b| compare_note_field(a, b, &sort.field));
        if sort.direction == SortDirection::Desc {
            sorted.reverse();
        }
    }
    Ok(sorted)
}

/// Stable insertion sort — result sets top out at a few hundred rows, so
/// an `O(n log n)` sort buys nothing over insertion sort.
fn insertion_sort<T>(items: &mut [T], mut less_than: impl FnMut(&T, &T) -> bool) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && less_than(&items[j], &items[j - 1]) {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

fn compare_issue_field(a: &Issue, b: &Issue, field: &str) -> bool {
    match field {
        "created" => a.created_at < b.created_at,
        "updated" => a.updated_at < b.updated_at,
        "closed" => a.closed_at.as_deref().unwrap_or("") < b.closed_at.as_deref().unwrap_or(""),
        "deleted" => a.deleted_at.as_deref().unwrap_or("") < b.deleted_at.as_deref().unwrap_or(""),
        "priority" => a.priority < b.priority,
        "points" => a.story_points.unwrap_or(0) < b.story_points.unwrap_or(0),
        "id" => a.id < b.id,
        "title" => a.title < b.title,
        "status" => a.status.as_str() < b.status.as_str(),
        _ => false,
    }
}

fn compare_note_field(a: &Note, b: &Note, field: &str) -> bool {
    match field {
        "created" => a.created_at < b.created_at,
        "updated" => a.updated_at < b.updated_at,
        "deleted" => a.deleted_at.as_deref().unwrap_or("") < b.deleted_at.as_deref().unwrap_or(""),
        "id" => a.id < b.id,
        "title" => a.title < b.title,
        _ => false,
    }
}

// --- Issue expression evaluation ----------------------------------------

fn eval_issue_expr(expr: &Expr, issue: &Issue, ctx: &EvalContext) -> TdResult<bool> {
    match expr {
        Expr::FieldExpr { field, op, value } => eval_issue_field(field, *op, value, issue, ctx),
        Expr::BinaryExpr { op, left, right } => {
            let l = eval_issue_expr(left, issue, ctx)?;
            match op {
                BoolOp::And => Ok(l && eval_issue_expr(right, issue, ctx)?),
                BoolOp::Or => Ok(l || eval_issue_expr(right, issue, ctx)?),
            }
        }
        Expr::UnaryExpr { expr } => Ok(!eval_issue_expr(expr, issue, ctx)?),
        Expr::FunctionCall { name, args } => eval_function(name, args, issue, ctx),
        Expr::TextSearch(text) => Ok(contains_fold(&issue.title, text) || contains_fold(&issue.description, text)),
    }
}

fn eval_issue_field(
    field: &str,
    op: CompareOp,
    value: &Value,
    issue: &Issue,
    ctx: &EvalContext,
) -> TdResult<bool> {
    if let Some((prefix, rest)) = field.split_once('.') {
        return eval_dotted_field(prefix, rest, op, value, issue, ctx);
    }

    match field {
        "id" => Ok(eval_string(&issue.id, op, value, ctx)),
        "title" => Ok(eval_string(&issue.title, op, value, ctx)),
        "description" => Ok(eval_string(&issue.description, op, value, ctx)),
        "status" => Ok(eval_string(issue.status.as_str(), op, value, ctx)),
        "type" => Ok(eval_string(issue.issue_type.as_str(), op, value, ctx)),
        "priority" => eval_priority(issue.priority, op, value),
        "points" => Ok(eval_number(issue.story_points, op, value)),
        // "assignee" has no literal column; it aliases to who is currently
        // working the issue.
        "assignee" => Ok(eval_opt_session(&issue.implementer_session, op, value, ctx)),
        "creator" => Ok(eval_string(&issue.creator_session, op, value, ctx)),
        "created" => Ok(eval_date(&issue.created_at, op, value, ctx)),
        "updated" => Ok(eval_date(&issue.updated_at, op, value, ctx)),
        "closed" => Ok(eval_opt_date(&issue.closed_at, op, value, ctx)),
        "deleted" => Ok(eval_opt_date(&issue.deleted_at, op, value, ctx)),
        "epic_id" | "parent_id" => Ok(eval_opt_string(&issue.parent, op, value, ctx)),
        _ => Ok(false),
    }
}

fn eval_dotted_field(
    prefix: &str,
    rest: &str,
    op: CompareOp,
    value: &Value,
    issue: &Issue,
    ctx: &EvalContext,
) -> TdResult<bool> {
    match prefix {
        "log" => {
            let rows = ctx.store.logs_for_issue(&issue.id)?;
            Ok(rows.iter().any(|row| match rest {
                "message" => eval_string(&row.message, op, value, ctx),
                "tag" => eval_string(row.tag.as_str(), op, value, ctx),
                "session_id" => eval_string(&row.session_id, op, value, ctx),
                "created" => eval_date(&row.created_at, op, value, ctx),
                _ => false,
            }))
        }
        "comment" => {
            let rows = ctx.store.comments_for_issue(&issue.id)?;
            Ok(rows.iter().any(|row| match rest {
                "body" => eval_string(&row.body, op, value, ctx),
                "session_id" => eval_string(&row.session_id, op, value, ctx),
                "created" => eval_date(&row.created_at, op, value, ctx),
                _ => false,
            }))
        }
        "handoff" => {
            let rows = ctx.store.handoffs_for_issue(&issue.id)?;
            Ok(rows.iter().any(|row| match rest {
                "version" => eval_number(Some(row.version), op, value),
                "session_id" => eval_string(&row.session_id, op, value, ctx),
                "created" => eval_date(&row.created_at, op, value, ctx),
                _ => false,
            }))
        }
        "file" => {
            let rows = ctx.store.issue_files_for_issue(&issue.id)?;
            Ok(rows.iter().any(|row| match rest {
                "path" => eval_string(&row.path, op, value, ctx),
                "created" => eval_date(&row.created_at, op, value, ctx),
                _ => false,
            }))
        }
        "epic" => {
            let Some(parent_id) = &issue.parent else {
                return Ok(false);
            };
            let parent = ctx.store.get_issue(parent_id)?;
            Ok(match rest {
                "title" => eval_string(&parent.title, op, value, ctx),
                "status" => eval_string(parent.status.as_str(), op, value, ctx),
                _ => false,
            })
        }
        _ => Ok(false),
    }
}

fn eval_note_expr(expr: &Expr, note: &Note) -> bool {
    match expr {
        Expr::FieldExpr { field, op, value } => eval_note_field(field, *op, value, note),
        Expr::BinaryExpr { op, left, right } => match op {
            BoolOp::And => eval_note_expr(left, note) && eval_note_expr(right, note),
            BoolOp::Or => eval_note_expr(left, note) || eval_note_expr(right, note),
        },
        Expr::UnaryExpr { expr } => !eval_note_expr(expr, note),
        Expr::FunctionCall { .. } => false,
        Expr::TextSearch(text) => contains_fold(&note.title, text) || contains_fold(&note.body, text),
    }
}

fn eval_note_field(field: &str, op: CompareOp, value: &Value, note: &Note) -> bool {
    let rest = field.strip_prefix("note.").unwrap_or(field);
    match rest {
        "id" => eval_string_plain(&note.id, op, value),
        "title" => eval_string_plain(&note.title, op, value),
        "body" => eval_string_plain(&note.body, op, value),
        "created" => eval_date_plain(&note.created_at, op, value),
        "updated" => eval_date_plain(&note.updated_at, op, value),
        "deleted" => match &note.deleted_at {
            Some(d) => eval_date_plain(d, op, value),
            None => matches!(value, Value::SpecialValue(SpecialKind::Empty | SpecialKind::Null))
                && matches!(op, CompareOp::Eq),
        },
        _ => false,
    }
}

// --- Functions ------------------------------------------------------------

fn eval_function(name: &str, args: &[Value], issue: &Issue, ctx: &EvalContext) -> TdResult<bool> {
    match name {
        "has" => has_field(arg_field(&args[0]), issue, ctx),
        "is" => {
            let status = arg_ident(&args[0]);
            Ok(crate::schema::IssueStatus::parse(&status.to_ascii_lowercase())
                .map(|s| s == issue.status)
                .unwrap_or(false))
        }
        "any" => {
            let field = arg_field(&args[0]);
            for candidate in &args[1..] {
                if eval_issue_field(field, CompareOp::Eq, candidate, issue, ctx)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        "blocks" => {
            let id = arg_field(&args[0]);
            Ok(ctx.deps.blocks(id).iter().any(|i| i == &issue.id))
        }
        "blocked_by" => {
            let id = arg_field(&args[0]);
            Ok(ctx.deps.blocked_by(&issue.id).iter().any(|i| i == id))
        }
        "child_of" => Ok(ctx.deps.child_of(&issue.id, arg_field(&args[0]))),
        "descendant_of" => Ok(ctx.deps.descendant_of(&issue.id, arg_field(&args[0]))),
        "is_ready" => Ok(ctx.deps.is_ready(&issue.id)),
        "has_open_deps" => Ok(ctx.deps.has_open_deps(&issue.id)),
        "rework" => is_rework(ctx.store, &issue.id, issue.status),
        _ => Ok(false),
    }
}

fn arg_field(v: &Value) -> &str {
    match v {
        Value::Identifier(s) | Value::StringValue(s) => s.as_str(),
        _ => "",
    }
}

fn arg_ident(v: &Value) -> String {
    match v {
        Value::Identifier(s) | Value::StringValue(s) => s.clone(),
        Value::NumberValue(n) => n.to_string(),
        _ => String::new(),
    }
}

fn has_field(field: &str, issue: &Issue, ctx: &EvalContext) -> TdResult<bool> {
    Ok(match field {
        "title" => !issue.title.is_empty(),
        "description" => !issue.description.is_empty(),
        "acceptance" => !issue.acceptance.is_empty(),
        "labels" => !issue.labels.is_empty(),
        "points" => issue.story_points.is_some(),
        "assignee" => issue.implementer_session.is_some(),
        "epic_id" | "parent_id" => issue.parent.is_some(),
        "closed" => issue.closed_at.is_some(),
        "deleted" => issue.deleted_at.is_some(),
        "log" => !ctx.store.logs_for_issue(&issue.id)?.is_empty(),
        "comment" => !ctx.store.comments_for_issue(&issue.id)?.is_empty(),
        "handoff" => !ctx.store.handoffs_for_issue(&issue.id)?.is_empty(),
        "file" => !ctx.store.issue_files_for_issue(&issue.id)?.is_empty(),
        _ => true,
    })
}

// --- Comparison primitives -------------------------------------------------

fn contains_fold(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

fn resolve_string_rhs(value: &Value, ctx: &EvalContext) -> String {
    match value {
        Value::StringValue(s) | Value::Identifier(s) => s.clone(),
        Value::NumberValue(n) => n.to_string(),
        Value::SpecialValue(SpecialKind::Me) => ctx.current_session.to_string(),
        Value::SpecialValue(SpecialKind::Empty) | Value::SpecialValue(SpecialKind::Null) => String::new(),
        Value::DateValue { raw, .. } => raw.clone(),
    }
}

fn eval_string(field_val: &str, op: CompareOp, value: &Value, ctx: &EvalContext) -> bool {
    if matches!(value, Value::SpecialValue(SpecialKind::Empty | SpecialKind::Null)) {
        let is_empty = field_val.is_empty();
        return match op {
            CompareOp::Eq => is_empty,
            CompareOp::Ne => !is_empty,
            _ => false,
        };
    }
    let rhs = resolve_string_rhs(value, ctx);
    match op {
        CompareOp::Eq => field_val.eq_ignore_ascii_case(&rhs),
        CompareOp::Ne => !field_val.eq_ignore_ascii_case(&rhs),
        CompareOp::Lt => field_val < rhs.as_str(),
        CompareOp::Gt => field_val > rhs.as_str(),
        CompareOp::Le => field_val <= rhs.as_str(),
        CompareOp::Ge => field_val >= rhs.as_str(),
        CompareOp::Match => contains_fold(field_val, &rhs),
        CompareOp::NotMatch => !contains_fold(field_val, &rhs),
    }
}

fn eval_string_plain(field_val: &str, op: CompareOp, value: &Value) -> bool {
    if matches!(value, Value::SpecialValue(SpecialKind::Empty | SpecialKind::Null)) {
        let is_empty = field_val.is_empty();
        return match op {
            CompareOp::Eq => is_empty,
            CompareOp::Ne => !is_empty,
            _ => false,
        };
    }
    let rhs = match value {
        Value::StringValue(s) | Value::Identifier(s) => s.clone(),
        Value::NumberValue(n) => n.to_string(),
        Value::DateValue { raw, .. } => raw.clone(),
        Value::SpecialValue(_) => String::new(),
    };
    match op {
        CompareOp::Eq => field_val.eq_ignore_ascii_case(&rhs),
        CompareOp::Ne => !field_val.eq_ignore_ascii_case(&rhs),
        CompareOp::Lt => field_val < rhs.as_str(),
        CompareOp::Gt => field_val > rhs.as_str(),
        CompareOp::Le => field_val <= rhs.as_str(),
        CompareOp::Ge => field_val >= rhs.as_str(),
        CompareOp::Match => contains_fold(field_val, &rhs),
        CompareOp::NotMatch => !contains_fold(field_val, &rhs),
    }
}

fn eval_opt_string(field_val: &Option<String>, op: CompareOp, value: &Value, ctx: &EvalContext) -> bool {
    match field_val {
        Some(s) => eval_string(s, op, value, ctx),
        None => eval_string("", op, value, ctx),
    }
}

fn eval_opt_session(field_val: &Option<String>, op: CompareOp, value: &Value, ctx: &EvalContext) -> bool {
    eval_opt_string(field_val, op, value, ctx)
}

fn eval_priority(priority: IssuePriority, op: CompareOp, value: &Value) -> TdResult<bool> {
    if matches!(value, Value::SpecialValue(SpecialKind::Empty | SpecialKind::Null)) {
        return Ok(matches!(op, CompareOp::Ne));
    }
    let ident = arg_ident(value);
    let rhs = IssuePriority::parse(&ident)
        .ok_or_else(|| TdError::InvalidInput(format!("unknown priority '{ident}'")))?;
    Ok(match op {
        CompareOp::Eq => priority == rhs,
        CompareOp::Ne => priority != rhs,
        CompareOp::Lt => priority < rhs,
        CompareOp::Gt => priority > rhs,
        CompareOp::Le => priority <= rhs,
        CompareOp::Ge => priority >= rhs,
        CompareOp::Match | CompareOp::NotMatch => false,
    })
}

fn eval_number(field_val: Option<i64>, op: CompareOp, value: &Value) -> bool {
    if matches!(value, Value::SpecialValue(SpecialKind::Empty | SpecialKind::Null)) {
        let is_zero = field_val.unwrap_or(0) == 0;
        return match op {
            CompareOp::Eq => is_zero,
            CompareOp::Ne => !is_zero,
            _ => false,
        };
    }
    let lhs = field_val.unwrap_or(0);
    let rhs = match value {
        Value::NumberValue(n) => *n,
        Value::StringValue(s) | Value::Identifier(s) => s.parse().unwrap_or(0),
        _ => 0,
    };
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Ge => lhs >= rhs,
        CompareOp::Match | CompareOp::NotMatch => false,
    }
}

/// Normalize an RFC3339 timestamp to an epoch-second integer. Unparseable
/// input normalizes to 0, the documented "zero value" for EMPTY/NULL
/// comparisons.
fn to_epoch_seconds(raw: &str) -> i64 {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

/// Normalize a TDQ date literal (absolute `YYYY-MM-DD`, relative offset
/// `[+-]?\d+[dwmh]`, or a keyword) to an epoch-second integer relative to
/// `now`.
fn resolve_date_rhs(value: &Value, ctx: &EvalContext) -> Option<i64> {
    let Value::DateValue { raw, relative } = value else {
        return None;
    };
    if !relative {
        let date = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        let dt = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(dt.timestamp());
    }

    let now = ctx.now;
    let today_start = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    match raw.as_str() {
        "today" => return Some(today_start.timestamp()),
        "yesterday" => return Some((today_start - Duration::days(1)).timestamp()),
        "this_week" => {
            let back = now.weekday().num_days_from_monday() as i64;
            return Some((today_start - Duration::days(back)).timestamp());
        }
        "last_week" => {
            let back = now.weekday().num_days_from_monday() as i64 + 7;
            return Some((today_start - Duration::days(back)).timestamp());
        }
        "this_month" => {
            let dt = today_start.with_day(1)?;
            return Some(dt.timestamp());
        }
        "last_month" => {
            let this_month_start = today_start.with_day(1)?;
            let last_month_end = this_month_start - Duration::days(1);
            let dt = last_month_end.with_day(1)?;
            return Some(dt.timestamp());
        }
        _ => {}
    }

    // `[+-]?\d+[dwmh]` offset from now.
    let (sign, rest) = match raw.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let unit = rest.chars().last()?;
    let magnitude: i64 = rest[..rest.len() - 1].parse().ok()?;
    let delta = match unit {
        'd' => Duration::days(magnitude),
        'w' => Duration::weeks(magnitude),
        'h' => Duration::hours(magnitude),
        'm' => Duration::days(magnitude * 30),
        _ => return None,
    };
    Some((now + delta * sign as i32).timestamp())
}

fn eval_date(field_val: &str, op: CompareOp, value: &Value, ctx: &EvalContext) -> bool {
    if matches!(value, Value::SpecialValue(SpecialKind::Empty | SpecialKind::Null)) {
        let is_zero = to_epoch_seconds(field_val) == 0;
        return match op {
            CompareOp::Eq => is_zero,
            CompareOp::Ne => !is_zero,
            _ => false,
        };
    }
    let Some(rhs) = resolve_date_rhs(value, ctx) else {
        return false;
    };
    let lhs = to_epoch_seconds(field_val);
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Ge => lhs >= rhs,
        CompareOp::Match | CompareOp::NotMatch => false,
    }
}

fn eval_date_plain(field_val: &str, op: CompareOp, value: &Value) -> bool {
    let Value::DateValue { raw, relative: false } = value else {
        return false;
    };
    let Some(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok() else {
        return false;
    };
    let Some(rhs_dt) = date.and_hms_opt(0, 0, 0) else {
        return false;
    };
    let rhs = rhs_dt.and_utc().timestamp();
    let lhs = to_epoch_seconds(field_val);
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Ge => lhs >= rhs,
        CompareOp::Match | CompareOp::NotMatch => false,
    }
}

fn eval_opt_date(field_val: &Option<String>, op: CompareOp, value: &Value, ctx: &EvalContext) -> bool {
    match field_val {
        Some(d) => eval_date(d, op, value, ctx),
        None => eval_date("", op, value, ctx),
    }
}

// unused with current IssueType match arms but kept for completeness of
// the issue-field dispatch table above (`type` field resolution).
#[allow(dead_code)]
fn issue_type_label(t: IssueType) -> &'static str {
    t.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IssueStatus, IssueType};
    use crate::store::Store;
    use crate::tdq::parser::parse;

    fn sample_issue(id: &str, status: IssueStatus, issue_type: IssueType) -> Issue {
        let now = Utc::now().to_rfc3339();
        Issue {
            id: id.to_string(),
            title: format!("issue {id}"),
            description: String::new(),
            issue_type,
            status,
            priority: IssuePriority::P2,
            story_points: None,
            labels: vec![],
            parent: None,
            acceptance: String::new(),
            creator_session: "ses_aaaaaaaa".to_string(),
            implementer_session: None,
            reviewer_session: None,
            minor: false,
            created_at: now.clone(),
            updated_at: now,
            closed_at: None,
            deleted_at: None,
            unknown_fields: Default::default(),
        }
    }

    #[test]
    fn filters_by_status_and_type() {
        let store = Store::open_in_memory().unwrap();
        store.insert_issue(&sample_issue("td-000001", IssueStatus::Open, IssueType::Bug)).unwrap();
        store.insert_issue(&sample_issue("td-000002", IssueStatus::Open, IssueType::Feature)).unwrap();
        store.insert_issue(&sample_issue("td-000003", IssueStatus::Closed, IssueType::Bug)).unwrap();

        let ctx = EvalContext::new(&store, "ses_aaaaaaaa", Utc::now()).unwrap();
        let query = parse("status = open AND type = bug").unwrap();
        let results = query_issues(&ctx, &query, 100).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "td-000001");
    }

    #[test]
    fn sort_desc_by_created() {
        let store = Store::open_in_memory().unwrap();
        let mut a = sample_issue("td-000001", IssueStatus::Open, IssueType::Task);
        a.created_at = "2026-01-01T00:00:00Z".to_string();
        let mut b = sample_issue("td-000002", IssueStatus::Open, IssueType::Task);
        b.created_at = "2026-01-02T00:00:00Z".to_string();
        store.insert_issue(&a).unwrap();
        store.insert_issue(&b).unwrap();

        let ctx = EvalContext::new(&store, "ses_aaaaaaaa", Utc::now()).unwrap();
        let query = parse("sort:-created").unwrap();
        let results = query_issues(&ctx, &query, 100).unwrap();
        assert_eq!(results[0].id, "td-000002");
    }

    #[test]
    fn is_ready_function_excludes_blocked_issue() {
        let store = Store::open_in_memory().unwrap();
        let blocker = sample_issue("td-bbbbbb", IssueStatus::Open, IssueType::Task);
        let target = sample_issue("td-aaaaaa", IssueStatus::Open, IssueType::Task);
        store.insert_issue(&blocker).unwrap();
        store.insert_issue(&target).unwrap();
        store
            .insert_dependency("td-aaaaaa", "td-bbbbbb", "blocks", "2026-01-01T00:00:00Z")
            .unwrap();

        let ctx = EvalContext::new(&store, "ses_aaaaaaaa", Utc::now()).unwrap();
        let query = parse("is_ready()").unwrap();
        let results = query_issues(&ctx, &query, 100).unwrap();
        let ids: Vec<&str> = results.iter().map(|i| i.id.as_str()).collect();
        assert!(!ids.contains(&"td-aaaaaa"));
        assert!(ids.contains(&"td-bbbbbb"));
    }

    #[test]
    fn at_me_resolves_to_current_session() {
        let store = Store::open_in_memory().unwrap();
        let mut issue = sample_issue("td-000001", IssueStatus::Open, IssueType::Task);
        issue.creator_session = "ses_aaaaaaaa".to_string();
        store.insert_issue(&issue).unwrap();

        let ctx = EvalContext::new(&store, "ses_aaaaaaaa", Utc::now()).unwrap();
        let query = parse("creator = @me").unwrap();
        let results = query_issues(&ctx, &query, 100).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_tests_zero_value() {
        let store = Store::open_in_memory().unwrap();
        store.insert_issue(&sample_issue("td-000001", IssueStatus::Open, IssueType::Task)).unwrap();

        let ctx = EvalContext::new(&store, "ses_aaaaaaaa", Utc::now()).unwrap();
        let query = parse("closed = EMPTY").unwrap();
        let results = query_issues(&ctx, &query, 100).unwrap();
        assert_eq!(results.len(), 1);
    }
}
