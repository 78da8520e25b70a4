//! Agent fingerprint and context-identifier derivation.
//!
//! Two independent derivations share ambient process/environment state but
//! serve different purposes:
//!
//! - the **fingerprint** scopes session records to a (branch, agent) pair;
//! - the **context identifier** is audit-only and never used for scoping.
//!
//! The env-var lists below are an extension point: which agent/terminal
//! variables to recognize is open-ended by nature, so the lists are seeded
//! with the common terminal-session and agent CLI variables and are
//! deliberately easy to extend.

/// Environment variables set by AI coding agent CLIs that carry a stable
/// per-invocation session identifier. Checked in order; first hit wins.
pub const AGENT_SESSION_VARS: &[(&str, &str)] = &[
    ("CLAUDE_SESSION_ID", "claude"),
    ("CLAUDECODE", "claude"),
    ("CURSOR_SESSION_ID", "cursor"),
    ("CODEX_SESSION_ID", "codex"),
    ("AIDER_SESSION_ID", "aider"),
];

/// Terminal multiplexer / emulator environment variables used as a fallback
/// context identifier when no agent-specific variable is present.
pub const TERMINAL_SESSION_VARS: &[&str] = &[
    "TERM_SESSION_ID",
    "TMUX_PANE",
    "STY",
    "WINDOWID",
    "KONSOLE_DBUS_SESSION",
    "GNOME_TERMINAL_SCREEN",
    "SSH_TTY",
];

/// Known agent executable names used for the process-ancestor walk fallback
/// when no agent environment variable is present.
pub const KNOWN_AGENT_EXECUTABLES: &[&str] = &["claude", "cursor-agent", "codex", "aider"];

/// Explicit fingerprint override variable.
pub const EXPLICIT_FINGERPRINT_VAR: &str = "TD_SESSION_ID";

fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
    .collect();
    cleaned.chars().take(32).collect()
}

/// Derive the agent fingerprint used to scope session records.
///
/// Precedence:
/// 1. Explicit override (`TD_SESSION_ID`) → `explicit_<sanitized>`.
/// 2. Documented agent environment variables → `<type>_<parent-pid>`.
/// 3. Process-ancestor walk against a known executable allowlist.
/// 4. Terminal / unknown fallback.
///
/// The result is always `<type>[_<pid-or-id>]`, non-alphanumerics replaced
/// with `_`, truncated to 32 chars.
pub fn derive_fingerprint(parent_pid: u32, ancestor_names: &[String]) -> String {
    if let Ok(explicit) = std::env::var(EXPLICIT_FINGERPRINT_VAR) {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return format!("explicit_{}", sanitize(trimmed))
            .chars()
            .take(32)
            .collect();
        }
    }

    for (var, agent_type) in AGENT_SESSION_VARS {
        if std::env::var(var).is_ok() {
            return format!("{agent_type}_{parent_pid}").chars().take(32).collect();
        }
    }

    for name in ancestor_names {
        let lower = name.to_ascii_lowercase();
        if let Some(known) = KNOWN_AGENT_EXECUTABLES
        .iter()
        .find(|exe| lower.contains(**exe))
        {
            return format!("{known}_{parent_pid}").chars().take(32).collect();
        }
    }

    for var in TERMINAL_SESSION_VARS {
        if std::env::var(var).is_ok() {
            return format!("terminal_{parent_pid}").chars().take(32).collect();
        }
    }

    format!("unknown_{parent_pid}").chars().take(32).collect()
}

/// Derive the audit-only "context identifier". Never used
/// for scoping — only recorded as `original_context_id` for forensics.
///
/// Precedence:
/// 1. Explicit override environment variable.
/// 2. Agent-supplied session identifiers.
/// 3. Terminal multiplexer / emulator identifiers.
/// 4. Parent-PID + controlling-tty, falling back to parent-PID + shell level.
pub fn derive_context_id(parent_pid: u32, tty: Option<&str>, shell_level: Option<&str>) -> String {
    if let Ok(explicit) = std::env::var(EXPLICIT_FINGERPRINT_VAR) {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    for (var, _) in AGENT_SESSION_VARS {
        if let Ok(v) = std::env::var(var) {
            return v;
        }
    }

    for var in TERMINAL_SESSION_VARS {
        if let Ok(v) = std::env::var(var) {
            return v;
        }
    }

    match tty {
        Some(t) => format!("pid{parent_pid}_{t}"),
        None => format!("pid{parent_pid}_shlvl{}", shell_level.unwrap_or("0")),
    }
}
