//! Session/actor resolution: the one piece of logic that is genuinely the
//! CLI's own rather than a thin pass-through to `td-core`. Every command
//! resolves a [`RunContext`] first,
//! then calls into [`td_core::mutators::Kernel`] or [`td_core::tdq`].
//!
//! Uses a `get_home_dir` + `resolve_config` resolve-then-open sequence,
//! retargeted from team/identity resolution onto
//! store-root resolution, session identity derivation, and config load.

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use sysinfo::{Pid, ProcessesToUpdate, System};
use td_core::config::{self, Config};
use td_core::home::get_home_dir;
use td_core::mutators::{Actor, Kernel};
use td_core::root::resolve_store_root;
use td_core::session::{self, fingerprint, SessionRecord};

/// Everything a command needs for one invocation: an open kernel, the
/// resolved session record, and the actor fields an [`Actor`] borrows from.
pub struct RunContext {
    pub kernel: Kernel,
    pub store_root: PathBuf,
    pub config: Config,
    pub session: SessionRecord,
    pub agent_type: String,
    pub context_role: String,
}

impl RunContext {
    pub fn actor(&self) -> Actor<'_> {
        Actor {
            session_id: &self.session.id,
            agent_type: &self.agent_type,
            context_role: &self.context_role,
        }
    }

    pub fn max_results(&self) -> usize {
        self.config.tdq.max_results
    }
}

fn current_branch(store_root: &std::path::Path) -> String {
    std::process::Command::new("git")
    .args(["rev-parse", "--abbrev-ref", "HEAD"])
    .current_dir(store_root)
    .output()
    .ok()
    .filter(|output| output.status.success())
    .and_then(|output| String::from_utf8(output.stdout).ok())
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| "no-branch".to_string())
}

/// Walk the process-ancestor chain (bounded depth) collecting executable
/// names for the fingerprint's allowlist fallback, and return the immediate
/// parent PID alongside it.
fn walk_ancestors(max_depth: usize) -> (u32, Vec<String>) {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let mut names = Vec::new();
    let mut parent_pid = 0u32;
    let mut pid = Pid::from_u32(std::process::id());

    for depth in 0..max_depth {
        let Some(process) = system.process(pid) else { break };
        let Some(parent) = process.parent() else { break };
        if depth == 0 {
            parent_pid = parent.as_u32();
        }
        if let Some(parent_process) = system.process(parent) {
            names.push(parent_process.name().to_string_lossy().into_owned());
        }
        pid = parent;
    }
    (parent_pid, names)
}

/// The controlling terminal, read via the stdin fd symlink on platforms
/// that expose `/proc` — the tty-based context-id fallback.
fn controlling_tty() -> Option<String> {
    std::fs::read_link("/proc/self/fd/0")
    .ok()
    .map(|p| p.to_string_lossy().into_owned())
}

/// Resolve store root, config, and session identity for the current
/// invocation, and open a [`Kernel`] against the result.
///
/// `force_rotate` is passed by the `session rotate` command; every other
/// command calls `get_or_create`.
pub fn resolve(force_rotate: bool) -> Result<RunContext> {
    let home_dir = get_home_dir().context("resolving home directory")?;
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let store_root = resolve_store_root(&cwd, &home_dir);

    let config = config::load(&store_root);
    let mode = config.core.enforcement_mode;

    let branch = current_branch(&store_root);
    let (parent_pid, ancestors) = walk_ancestors(8);
    let agent_fingerprint = fingerprint::derive_fingerprint(parent_pid, &ancestors);
    let agent_type = agent_fingerprint
    .split('_')
    .next()
    .unwrap_or("unknown")
    .to_string();
    let tty = controlling_tty();
    let shell_level = std::env::var("SHLVL").ok();
    let context_id =
    fingerprint::derive_context_id(parent_pid, tty.as_deref(), shell_level.as_deref());

    let session = if force_rotate {
        session::rotate(&store_root, &branch, &agent_fingerprint, &agent_type, parent_pid, &context_id)
        .context("rotating session")?
    } else {
        session::get_or_create(&store_root, &branch, &agent_fingerprint, &agent_type, parent_pid, &context_id)
        .context("resolving session")?
    };

    let context_role = if std::env::var("TD_ADMIN").is_ok() {
        "admin"
    } else {
        "user"
    }
    .to_string();

    let kernel = Kernel::open(&store_root, mode).context("opening store")?;

    Ok(RunContext {
            kernel,
            store_root,
            config,
            session,
            agent_type,
            context_role,
    })
}
