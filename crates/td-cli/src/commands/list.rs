//! `td list`: TDQ queries. Routes to the issue or note evaluator
//! depending on whether the parsed expression contains a `note.*` field.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::tdq::{ast, evaluator, parser, validator};

/// List issues (or notes) matching a TDQ filter
#[derive(Args, Debug)]
pub struct ListArgs {
    /// TDQ filter expression, e.g. `status = open AND type = bug sort:-created`
    query: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: ListArgs, ctx: &RunContext) -> Result<()> {
    let text = args.query.clone().unwrap_or_default();
    let query = match parser::parse(&text) {
        Ok(q) => q,
        Err(e) => output::fail_invalid(args.json, &e.message),
    };

    let problems = validator::validate(&query);
    if !problems.is_empty() {
        output::fail_invalid(args.json, &problems.join("; "));
    }

    let eval_ctx = output::unwrap_or_fail(
        args.json,
        evaluator::EvalContext::new(ctx.kernel.store(), &ctx.session.id, chrono::Utc::now()),
    );
    let max_results = ctx.max_results();
    let routes_to_notes = query.expr.as_ref().map(ast::routes_to_notes).unwrap_or(false);

    if routes_to_notes {
        let notes = output::unwrap_or_fail(args.json, evaluator::query_notes(&eval_ctx, &query, max_results));
        output::print_notes(&notes, args.json);
    } else {
        let issues = output::unwrap_or_fail(args.json, evaluator::query_issues(&eval_ctx, &query, max_results));
        output::print_issues(&issues, args.json);
    }
    Ok(())
}
