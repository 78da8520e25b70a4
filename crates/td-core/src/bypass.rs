//! Bypass policy: composes the involvement ledger and issue state into the
//! approve/close decision functions shared by every entry point.

use crate::error::TdResult;
use crate::involvement;
use crate::schema::Issue;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCloseException {
    pub reason: String,
}

/// Read `was_involved`, fail-closed on error: a transient ledger read
/// failure must never be usable to evade review.
fn was_involved_fail_closed(store: &Store, issue_id: &str, session_id: &str) -> bool {
    involvement::was_involved(store, issue_id, session_id).unwrap_or(true)
}

/// `approve` (`in_review -> closed`): `minor ∨ ¬(was_involved ∨ session = creator ∨ session = implementer)`.
pub fn approve_allowed(store: &Store, issue: &Issue, session_id: &str) -> TdResult<bool> {
    if issue.minor {
        return Ok(true);
    }
    let involved = was_involved_fail_closed(store, &issue.id, session_id);
    let is_creator = issue.creator_session == session_id;
    let is_implementer = issue.implementer_session.as_deref() == Some(session_id);
    Ok(!(involved || is_creator || is_implementer))
}

/// `close` (`* -> closed`, outside the approve path):
/// ```text
/// ¬(was_involved ∨ session = creator ∨ session = implementer) # uninvolved
/// ∨ (session = creator ∧ implementer ≠ ∅ ∧ implementer ≠ session) # delegated
/// ∨ minor
/// ∨ self_close_exception provided # audited bypass
/// ```
pub fn close_allowed(
    store: &Store,
    issue: &Issue,
    session_id: &str,
    exception: Option<&SelfCloseException>,
) -> TdResult<bool> {
    if issue.minor || exception.is_some() {
        return Ok(true);
    }
    let involved = was_involved_fail_closed(store, &issue.id, session_id);
    let is_creator = issue.creator_session == session_id;
    let is_implementer = issue.implementer_session.as_deref() == Some(session_id);
    let uninvolved = !(involved || is_creator || is_implementer);
    let delegated = is_creator
    && issue.implementer_session.is_some()
    && issue.implementer_session.as_deref() != Some(session_id);
    Ok(uninvolved || delegated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::involvement::InvolvementAction;
    use crate::schema::{IssuePriority, IssueStatus, IssueType};
    use chrono::Utc;

    fn base_issue() -> Issue {
        let now = Utc::now().to_rfc3339();
        Issue {
            id: "td-abc123".to_string(),
            title: "t".to_string(),
            description: String::new(),
            issue_type: IssueType::Task,
            status: IssueStatus::InReview,
            priority: IssuePriority::P2,
            story_points: None,
            labels: vec![],
            parent: None,
            acceptance: String::new(),
            creator_session: "ses_creator1".to_string(),
            implementer_session: Some("ses_implem1".to_string()),
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
    fn self_approve_blocked() {
        let store = Store::open_in_memory().unwrap();
        let mut issue = base_issue();
        issue.creator_session = "ses_a".to_string();
        issue.implementer_session = Some("ses_a".to_string());
        involvement::record(
            &store,
            &issue.id,
            "ses_a",
            InvolvementAction::Started,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        assert!(!approve_allowed(&store, &issue, "ses_a").unwrap());
    }

    #[test]
    fn third_party_approve_allowed() {
        let store = Store::open_in_memory().unwrap();
        let mut issue = base_issue();
        issue.creator_session = "ses_a".to_string();
        issue.implementer_session = Some("ses_a".to_string());
        involvement::record(
            &store,
            &issue.id,
            "ses_a",
            InvolvementAction::Started,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        assert!(approve_allowed(&store, &issue, "ses_c").unwrap());
    }

    #[test]
    fn unstart_does_not_launder_involvement() {
        let store = Store::open_in_memory().unwrap();
        let mut issue = base_issue();
        issue.creator_session = "ses_a".to_string();
        issue.implementer_session = Some("ses_b".to_string());
        involvement::record(&store, &issue.id, "ses_a", InvolvementAction::Started, "t1").unwrap();
        involvement::record(&store, &issue.id, "ses_a", InvolvementAction::Unstarted, "t2").unwrap();
        involvement::record(&store, &issue.id, "ses_b", InvolvementAction::Started, "t3").unwrap();
        involvement::record(&store, &issue.id, "ses_b", InvolvementAction::Reviewed, "t4").unwrap();

        assert!(!approve_allowed(&store, &issue, "ses_a").unwrap());
    }

    #[test]
    fn creator_with_delegate_close_allowed() {
        let store = Store::open_in_memory().unwrap();
        let mut issue = base_issue();
        issue.creator_session = "ses_a".to_string();
        issue.implementer_session = Some("ses_b".to_string());
        involvement::record(&store, &issue.id, "ses_a", InvolvementAction::Created, "t1").unwrap();
        assert!(close_allowed(&store, &issue, "ses_a", None).unwrap());
    }

    #[test]
    fn minor_self_approve_allowed() {
        let store = Store::open_in_memory().unwrap();
        let mut issue = base_issue();
        issue.minor = true;
        issue.creator_session = "ses_a".to_string();
        issue.implementer_session = Some("ses_a".to_string());
        assert!(approve_allowed(&store, &issue, "ses_a").unwrap());
        assert!(close_allowed(&store, &issue, "ses_a", None).unwrap());
    }

    #[test]
    fn self_close_exception_audited_bypass_allows_close() {
        let store = Store::open_in_memory().unwrap();
        let mut issue = base_issue();
        issue.creator_session = "ses_a".to_string();
        issue.implementer_session = Some("ses_a".to_string());
        involvement::record(&store, &issue.id, "ses_a", InvolvementAction::Started, "t1").unwrap();
        let exception = SelfCloseException {
            reason: "urgent hotfix".to_string(),
        };
        assert!(close_allowed(&store, &issue, "ses_a", Some(&exception)).unwrap());
    }
}
