//! Plain-text and `--json` rendering.
//!
//! Every read command prints either a stable single-line/plain-list form or,
//! with `--json`, the serialized entity/entities. Every mutator prints one of
//! a fixed set of documented stable messages. Failures render as `ERROR:
//! <message>` (exit 1 or 2) or the `{"error": {"code", "message"}}` JSON
//! shape, applied consistently across every command.

use serde::Serialize;
use td_core::error::{TdError, TdResult};
use td_core::schema::{Board, BoardPosition, Comment, GitSnapshot, Handoff, Issue, IssueFile, Log, Note, WorkSession};

fn issue_line(issue: &Issue) -> String {
    let mut line = format!(
        "{} [{}] {} ({}, {})",
        issue.id,
        issue.status.as_str(),
        issue.title,
        issue.issue_type.as_str(),
        issue.priority.as_str()
    );
    if issue.is_deleted() {
        line.push_str(" [deleted]");
    }
    line
}

pub fn print_issue(issue: &Issue, json: bool) {
    if json {
        print_json(issue);
    } else {
        println!("{}", issue_line(issue));
    }
}

pub fn print_issues(issues: &[Issue], json: bool) {
    if json {
        print_json(issues);
    } else if issues.is_empty() {
        println!("(no matching issues)");
    } else {
        for issue in issues {
            println!("{}", issue_line(issue));
        }
    }
}

fn note_line(note: &Note) -> String {
    let mut line = format!("{} {}", note.id, note.title);
    if note.deleted_at.is_some() {
        line.push_str(" [deleted]");
    }
    line
}

pub fn print_note(note: &Note, json: bool) {
    if json {
        print_json(note);
    } else {
        println!("{}", note_line(note));
    }
}

pub fn print_notes(notes: &[Note], json: bool) {
    if json {
        print_json(notes);
    } else if notes.is_empty() {
        println!("(no matching notes)");
    } else {
        for note in notes {
            println!("{}", note_line(note));
        }
    }
}

pub fn print_board(board: &Board, positions: &[BoardPosition], json: bool) {
    if json {
        print_json(&serde_json::json!({ "board": board, "positions": positions }));
        return;
    }
    println!("{} {}", board.id, board.name);
    for position in positions {
        println!("  [{}] {} (pos {})", position.column, position.issue_id, position.position);
    }
}

pub fn print_boards(boards: &[Board], json: bool) {
    if json {
        print_json(boards);
    } else if boards.is_empty() {
        println!("(no boards)");
    } else {
        for board in boards {
            println!("{} {}", board.id, board.name);
        }
    }
}

pub fn print_work_session(ws: &WorkSession, json: bool) {
    if json {
        print_json(ws);
        return;
    }
    let state = if ws.ended_at.is_some() { "ended" } else { "active" };
    println!("{} ({state}) issues: {}", ws.id, ws.issue_ids.join(", "));
}

pub fn print_log(log: &Log, json: bool) {
    if json {
        print_json(log);
    } else {
        println!("{} [{}] {}", log.id, log.tag.as_str(), log.message);
    }
}

pub fn print_handoff(handoff: &Handoff, json: bool) {
    if json {
        print_json(handoff);
    } else {
        println!("{} v{} done: {}", handoff.id, handoff.version, handoff.done);
    }
}

pub fn print_comment(comment: &Comment, json: bool) {
    if json {
        print_json(comment);
    } else {
        println!("{} {}", comment.id, comment.body);
    }
}

pub fn print_git_snapshot(snapshot: &GitSnapshot, json: bool) {
    if json {
        print_json(snapshot);
    } else {
        println!("{} {}@{}", snapshot.id, snapshot.branch, snapshot.commit);
    }
}

pub fn print_issue_file(file: &IssueFile, json: bool) {
    if json {
        print_json(file);
    } else {
        println!("{} {}", file.id, file.path);
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("ERROR: failed to serialize output: {e}"),
    }
}

/// Exit code for a [`TdError`]: validation/usage failures are 2, everything
/// else is a generic failure (1).
fn exit_code_for(err: &TdError) -> i32 {
    match err {
        TdError::InvalidInput(_) => 2,
        _ => 1,
    }
}

/// Render a [`TdError`] and exit with the matching code.
/// Every command that calls into a `Kernel`/`tdq` operation routes its `Err`
/// branch through this so the exit-code/JSON-shape contract lives in one
/// place instead of being re-derived per command.
pub fn fail(json: bool, err: &TdError) -> ! {
    if json {
        print_json(&serde_json::json!({
            "error": { "code": err.code(), "message": err.to_string() }
        }));
    } else {
        eprintln!("ERROR: {err}");
    }
    std::process::exit(exit_code_for(err));
}

/// Unwrap a `TdResult`, rendering and exiting via [`fail`] on `Err` so every
/// command site reads as a single straight-line call instead of a match.
pub fn unwrap_or_fail<T>(json: bool, result: TdResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => fail(json, &e),
    }
}

/// Render a non-`TdError` validation failure (TDQ parse/validate errors,
/// which carry their own message shape) as `invalid_input` and exit 2.
pub fn fail_invalid(json: bool, message: &str) -> ! {
    if json {
        print_json(&serde_json::json!({
            "error": { "code": "invalid_input", "message": message }
        }));
    } else {
        eprintln!("ERROR: {message}");
    }
    std::process::exit(2);
}
