//! A fresh process re-deriving the same (branch, fingerprint) pair must
//! resolve back to the same session record rather than minting a new one,
//! and an explicit rotation must still chain to the prior identity.

use serial_test::serial;
use td_core::session::{self, fingerprint};
use tempfile::TempDir;

#[test]
#[serial]
fn repeated_invocations_on_the_same_branch_reuse_one_session() {
    unsafe {
        std::env::remove_var(fingerprint::EXPLICIT_FINGERPRINT_VAR);
        std::env::set_var("CLAUDE_SESSION_ID", "whatever");
    }
    let dir = TempDir::new().unwrap();
    let fp = fingerprint::derive_fingerprint(4242, &[]);
    let ctx_id = fingerprint::derive_context_id(4242, None, None);

    let first = session::get_or_create(dir.path(), "main", &fp, "claude", 4242, &ctx_id).unwrap();
    let second = session::get_or_create(dir.path(), "main", &fp, "claude", 4242, &ctx_id).unwrap();
    assert_eq!(first.id, second.id);
    assert!(second.last_activity >= first.last_activity);

    unsafe {
        std::env::remove_var("CLAUDE_SESSION_ID");
    }
}

#[test]
#[serial]
fn rotation_preserves_the_audit_trail_back_to_the_prior_session() {
    unsafe {
        std::env::remove_var(fingerprint::EXPLICIT_FINGERPRINT_VAR);
        std::env::set_var("CLAUDE_SESSION_ID", "whatever");
    }
    let dir = TempDir::new().unwrap();
    let fp = fingerprint::derive_fingerprint(77, &[]);

    let original = session::get_or_create(dir.path(), "main", &fp, "claude", 77, "ctx-1").unwrap();
    let rotated = session::rotate(dir.path(), "main", &fp, "claude", 77, "ctx-2").unwrap();
    assert_ne!(rotated.id, original.id);
    assert_eq!(rotated.previous_session_id, Some(original.id));

    let resumed = session::get_or_create(dir.path(), "main", &fp, "claude", 77, "ctx-2").unwrap();
    assert_eq!(resumed.id, rotated.id);

    unsafe {
        std::env::remove_var("CLAUDE_SESSION_ID");
    }
}

#[test]
#[serial]
fn changing_the_explicit_override_chains_to_the_prior_session() {
    // E8: with TD_SESSION_ID=foo then =bar across two invocations, the
    // second resolves to a new session id whose previous_session_id is the
    // first — a dimension change (the fingerprint) must still chain the
    // identity, not start a fresh, unlinked record.
    unsafe {
        std::env::remove_var("CLAUDE_SESSION_ID");
        std::env::set_var(fingerprint::EXPLICIT_FINGERPRINT_VAR, "foo");
    }
    let dir = TempDir::new().unwrap();
    let fp_foo = fingerprint::derive_fingerprint(10, &[]);
    let ctx_foo = fingerprint::derive_context_id(10, None, None);
    let first = session::get_or_create(dir.path(), "main", &fp_foo, "explicit", 10, &ctx_foo).unwrap();

    unsafe {
        std::env::set_var(fingerprint::EXPLICIT_FINGERPRINT_VAR, "bar");
    }
    let fp_bar = fingerprint::derive_fingerprint(10, &[]);
    let ctx_bar = fingerprint::derive_context_id(10, None, None);
    assert_ne!(fp_foo, fp_bar);
    let second = session::get_or_create(dir.path(), "main", &fp_bar, "explicit", 10, &ctx_bar).unwrap();

    assert_ne!(second.id, first.id);
    assert_eq!(second.previous_session_id, Some(first.id));

    unsafe {
        std::env::remove_var(fingerprint::EXPLICIT_FINGERPRINT_VAR);
    }
}

#[test]
#[serial]
fn distinct_branches_never_share_a_session() {
    unsafe {
        std::env::remove_var(fingerprint::EXPLICIT_FINGERPRINT_VAR);
        std::env::set_var("CLAUDE_SESSION_ID", "whatever");
    }
    let dir = TempDir::new().unwrap();
    let fp = fingerprint::derive_fingerprint(5, &[]);

    let on_main = session::get_or_create(dir.path(), "main", &fp, "claude", 5, "ctx").unwrap();
    let on_feature = session::get_or_create(dir.path(), "feature/x", &fp, "claude", 5, "ctx").unwrap();
    assert_ne!(on_main.id, on_feature.id);

    unsafe {
        std::env::remove_var("CLAUDE_SESSION_ID");
    }
}
