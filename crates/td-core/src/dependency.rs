//! Dependency engine.
//!
//! `is_ready`, `has_open_deps`, `descendant_of`, and `rework` are all
//! defined in terms of a single precomputed index built in one scan over
//! the store, so the TDQ evaluator can call these cheaply per
//! candidate row instead of re-querying the store per function call.

use crate::action_log;
use crate::error::TdResult;
use crate::schema::IssueStatus;
use crate::store::Store;
use std::collections::{HashMap, HashSet};

/// The full dependency/parent graph for a store, snapshotted once per
/// query.
pub struct DependencyIndex {
    /// issue_id -> [(depends_on_id, relation_type)]
    deps_of: HashMap<String, Vec<(String, String)>>,
    /// depends_on_id -> [issue_id] (reverse of deps_of)
    blocked_by_index: HashMap<String, Vec<String>>,
    /// parent_id -> [child_id]
    children_of: HashMap<String, Vec<String>>,
    /// issue_id -> closed or soft-deleted
    closed_or_deleted: HashSet<String>,
}

impl DependencyIndex {
    /// Build the index with a single pass over `issues` and `dependencies`.
    pub fn build(store: &Store) -> TdResult<Self> {
        let issues = store.list_issues(true)?;
        let all_deps = store.all_dependencies()?;

        let mut closed_or_deleted = HashSet::new();
        let mut children_of: HashMap<String, Vec<String>> = HashMap::new();
        for issue in &issues {
            if issue.status == IssueStatus::Closed || issue.is_deleted() {
                closed_or_deleted.insert(issue.id.clone());
            }
            if let Some(parent) = &issue.parent {
                children_of.entry(parent.clone()).or_default().push(issue.id.clone());
            }
        }

        let mut deps_of: HashMap<String, Vec<(String, String)>> = HashMap::new();
        let mut blocked_by_index: HashMap<String, Vec<String>> = HashMap::new();
        for (issue_id, depends_on_id) in all_deps {
            blocked_by_index
            .entry(depends_on_id.clone())
            .or_default()
            .push(issue_id.clone());
            deps_of
            .entry(issue_id)
            .or_default()
            .push((depends_on_id, "blocks".to_string()));
        }

        Ok(Self {
                deps_of,
                blocked_by_index,
                children_of,
                closed_or_deleted,
        })
    }

    /// An issue is ready when every dependency edge points to a closed or
    /// soft-deleted issue (or it has none).
    pub fn is_ready(&self, issue_id: &str) -> bool {
        !self.has_open_deps(issue_id)
    }

    pub fn has_open_deps(&self, issue_id: &str) -> bool {
        match self.deps_of.get(issue_id) {
            None => false,
            Some(deps) => deps
            .iter()
            .any(|(dep_id, _)| !self.closed_or_deleted.contains(dep_id)),
        }
    }

    /// Issues that `issue_id` blocks: rows where `issue_id` is the
    /// `depends_on_id` (others depend on it).
    pub fn blocks(&self, issue_id: &str) -> Vec<String> {
        self.blocked_by_index
        .get(issue_id)
        .cloned()
        .unwrap_or_default()
    }

    /// Issues that block `issue_id`: the other side of the same edge set,
    /// i.e. `issue_id`'s own `depends_on_id` list.
    pub fn blocked_by(&self, issue_id: &str) -> Vec<String> {
        self.deps_of
        .get(issue_id)
        .map(|deps| deps.iter().map(|(id, _)| id.clone()).collect())
        .unwrap_or_default()
    }

    pub fn child_of(&self, candidate_id: &str, parent_id: &str) -> bool {
        self.children_of
        .get(parent_id)
        .map(|children| children.iter().any(|c| c == candidate_id))
        .unwrap_or(false)
    }

    /// Transitive closure of the parent relation rooted at `root_id`.
    pub fn descendants_of(&self, root_id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut frontier = vec![root_id.to_string()];
        let mut seen = HashSet::new();
        seen.insert(root_id.to_string());
        while let Some(current) = frontier.pop() {
            if let Some(children) = self.children_of.get(&current) {
                for child in children {
                    if seen.insert(child.clone()) {
                        out.push(child.clone());
                        frontier.push(child.clone());
                    }
                }
            }
        }
        out
    }

    pub fn descendant_of(&self, candidate_id: &str, root_id: &str) -> bool {
        self.descendants_of(root_id).iter().any(|id| id == candidate_id)
    }
}

/// Issues whose most recent `reject` action in the action-log is not
/// followed by a later `review` action, and whose current status is
/// `in_progress`.
pub fn is_rework(store: &Store, issue_id: &str, status: IssueStatus) -> TdResult<bool> {
    if status != IssueStatus::InProgress {
        return Ok(false);
    }
    let history = action_log::history_for_entity(store, "issue", issue_id)?;
    let reject_idx = history.iter().position(|e| e.action_type == "reject");
    let Some(reject_idx) = reject_idx else {
        return Ok(false);
    };
    // history is most-recent-first; a later review has a *smaller* index.
    let review_idx = history.iter().position(|e| e.action_type == "review");
    match review_idx {
        Some(idx) if idx < reject_idx => Ok(false),
        _ => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Issue, IssuePriority, IssueType};
    use chrono::Utc;

    fn sample_issue(id: &str, parent: Option<&str>, status: IssueStatus) -> Issue {
        let now = Utc::now().to_rfc3339();
        Issue {
            id: id.to_string(),
            title: "t".to_string(),
            description: String::new(),
            issue_type: IssueType::Task,
            status,
            priority: IssuePriority::P2,
            story_points: None,
            labels: vec![],
            parent: parent.map(str::to_string),
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
    fn ready_when_no_open_deps() {
        let store = Store::open_in_memory().unwrap();
        let blocker = sample_issue("td-blocker", None, IssueStatus::Closed);
        let target = sample_issue("td-target", None, IssueStatus::Open);
        store.insert_issue(&blocker).unwrap();
        store.insert_issue(&target).unwrap();
        store
        .insert_dependency("td-target", "td-blocker", "blocks", "2026-01-01T00:00:00Z")
        .unwrap();

        let idx = DependencyIndex::build(&store).unwrap();
        assert!(idx.is_ready("td-target"));
        assert!(!idx.has_open_deps("td-target"));
    }

    #[test]
    fn not_ready_when_dep_open() {
        let store = Store::open_in_memory().unwrap();
        let blocker = sample_issue("td-blocker", None, IssueStatus::Open);
        let target = sample_issue("td-target", None, IssueStatus::Open);
        store.insert_issue(&blocker).unwrap();
        store.insert_issue(&target).unwrap();
        store
        .insert_dependency("td-target", "td-blocker", "blocks", "2026-01-01T00:00:00Z")
        .unwrap();

        let idx = DependencyIndex::build(&store).unwrap();
        assert!(!idx.is_ready("td-target"));
        assert!(idx.has_open_deps("td-target"));
        assert_eq!(idx.blocks("td-blocker"), vec!["td-target".to_string()]);
        assert_eq!(idx.blocked_by("td-target"), vec!["td-blocker".to_string()]);
    }

    #[test]
    fn descendants_follow_parent_chain() {
        let store = Store::open_in_memory().unwrap();
        store.insert_issue(&sample_issue("td-epic", None, IssueStatus::Open)).unwrap();
        store
        .insert_issue(&sample_issue("td-child", Some("td-epic"), IssueStatus::Open))
        .unwrap();
        store
        .insert_issue(&sample_issue("td-grandchild", Some("td-child"), IssueStatus::Open))
        .unwrap();

        let idx = DependencyIndex::build(&store).unwrap();
        let descendants = idx.descendants_of("td-epic");
        assert!(descendants.contains(&"td-child".to_string()));
        assert!(descendants.contains(&"td-grandchild".to_string()));
        assert!(idx.descendant_of("td-grandchild", "td-epic"));
        assert!(idx.child_of("td-child", "td-epic"));
        assert!(!idx.child_of("td-grandchild", "td-epic"));
    }

    #[test]
    fn rework_detects_unreviewed_reject() {
        let store = Store::open_in_memory().unwrap();
        action_log::append(
            &store,
            "ses_aaaaaaaa",
            "review",
            "issue",
            "td-abc123",
            None,
            None,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        action_log::append(
            &store,
            "ses_bbbbbbbb",
            "reject",
            "issue",
            "td-abc123",
            None,
            None,
            "2026-01-01T00:01:00Z",
        )
        .unwrap();

        assert!(is_rework(&store, "td-abc123", IssueStatus::InProgress).unwrap());
        assert!(!is_rework(&store, "td-abc123", IssueStatus::Open).unwrap());
    }

    #[test]
    fn rework_false_after_fresh_review() {
        let store = Store::open_in_memory().unwrap();
        action_log::append(
            &store,
            "ses_aaaaaaaa",
            "reject",
            "issue",
            "td-abc123",
            None,
            None,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        action_log::append(
            &store,
            "ses_bbbbbbbb",
            "review",
            "issue",
            "td-abc123",
            None,
            None,
            "2026-01-01T00:01:00Z",
        )
        .unwrap();

        assert!(!is_rework(&store, "td-abc123", IssueStatus::InProgress).unwrap());
    }
}
