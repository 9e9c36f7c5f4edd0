use blameworthy::diff_view::RowKind;
use blameworthy::error::{Error, Missing};
use blameworthy::model::{CommitInfo, Future, LineRef};
use blameworthy::parser::parse_log_str;
use blameworthy::registry::{BlameRegistry, ObjectStore, RepoIndex};
use blameworthy::{GitHistory, Result};
use std::collections::HashMap;

const LOG: &str = "\
commit a1
author Ann <ann@example.com>
date 2017-01-02 10:00:00 +0000
subject Add f

--- /dev/null
+++ f
@@ -0,0 +1,3 @@
+one
+two
+three
commit b2
author Bob <bob@example.com>
date 2017-01-03 10:00:00 +0000
subject Shout

--- f
+++ f
@@ -2 +2 @@
-two
+TWO
commit c3
author Ann <ann@example.com>
date 2017-01-04 10:00:00 +0000
subject Drop first line

--- f
+++ f
@@ -1 +0,0 @@
-one
";

/// File contents keyed by commit and path
#[derive(Default)]
struct MemoryStore {
    commits: HashMap<String, CommitInfo>,
    blobs: HashMap<(String, String), String>,
}

impl MemoryStore {
    /// A commit that knows its subject but nothing else
    fn commit(mut self, commit: &str) -> Self {
        self.commits.insert(
            commit.to_string(),
            CommitInfo { hash: commit.to_string(), subject: format!("commit {commit}"), ..Default::default() },
        );
        self
    }

    fn with(self, commit: &str, path: &str, text: &str) -> Self {
        let mut store = self.commit(commit);
        store.blobs.insert((commit.to_string(), path.to_string()), text.to_string());
        store
    }
}

impl ObjectStore for MemoryStore {
    fn resolve(&self, revision: &str) -> Result<CommitInfo> {
        self.commits
            .get(revision)
            .cloned()
            .ok_or_else(|| Missing::Commit(revision.to_string()).into())
    }

    fn blob(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(&(commit.to_string(), path.to_string())).map(|t| t.clone().into_bytes()))
    }
}

fn store() -> MemoryStore {
    MemoryStore::default()
        .with("a1", "f", "one\ntwo\nthree\n")
        .with("b2", "f", "one\nTWO\nthree\n")
        .with("c3", "f", "TWO\nthree\n")
}

fn repo(store: MemoryStore) -> RepoIndex {
    let history = GitHistory::build(parse_log_str(LOG).unwrap()).unwrap();
    RepoIndex::new("demo", history, Box::new(store))
}

fn touched(commit: &str, line: usize) -> Option<Future> {
    Some(Future::ModifiedBy(LineRef::new(commit, line)))
}

#[test]
fn test_file_view_shows_origin_and_fate() {
    let view = repo(store()).file_view("b2", "f").unwrap();
    assert_eq!(view.commit.subject, "commit b2");
    assert_eq!(view.commit.author, "Bob <bob@example.com>");
    assert_eq!(view.commit.date, "2017-01-03 10:00:00 +0000");
    assert_eq!(view.previous_commit.as_deref(), Some("a1"));
    assert_eq!(view.next_commit.as_deref(), Some("c3"));

    let texts: Vec<&str> = view.rows.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "TWO", "three"]);
    assert!(view.rows.iter().all(|r| r.kind == RowKind::Context));

    assert_eq!(view.rows[0].previous, Some(LineRef::new("a1", 1)));
    assert_eq!(view.rows[0].next, touched("c3", 1));
    assert_eq!(view.rows[1].previous, Some(LineRef::new("b2", 2)));
    assert_eq!(view.rows[1].next, Some(Future::StillExists));
    assert_eq!(view.rows[2].previous, Some(LineRef::new("a1", 3)));
    assert_eq!((view.rows[2].old_line, view.rows[2].new_line), (3, 3));
}

#[test]
fn test_first_commit_lines_point_at_their_replacements() {
    let view = repo(store()).file_view("a1", "f").unwrap();
    let next: Vec<Option<Future>> = view.rows.iter().map(|r| r.next.clone()).collect();
    assert_eq!(next, vec![touched("c3", 1), touched("b2", 2), Some(Future::StillExists)]);
    assert_eq!(view.previous_commit, None);
}

#[test]
fn test_diff_view_of_a_replacement() {
    let view = repo(store()).diff_view("b2", "f").unwrap();
    let kinds: Vec<RowKind> = view.rows.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RowKind::Context, RowKind::Removed, RowKind::Added, RowKind::Context]);

    let removed = &view.rows[1];
    assert_eq!(removed.text, "two");
    assert_eq!(removed.previous, Some(LineRef::new("a1", 2)));
    assert_eq!(removed.next, None);

    let added = &view.rows[2];
    assert_eq!(added.text, "TWO");
    assert_eq!(added.previous, None);
    assert_eq!(added.next, Some(Future::StillExists));

    assert_eq!(view.rows[0].next, touched("c3", 1));
}

#[test]
fn test_diff_view_of_a_deletion() {
    let view = repo(store()).diff_view("c3", "f").unwrap();
    let kinds: Vec<RowKind> = view.rows.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RowKind::Removed, RowKind::Context, RowKind::Context]);
    assert_eq!(view.rows[0].previous, Some(LineRef::new("a1", 1)));
    assert_eq!((view.rows[1].old_line, view.rows[1].new_line), (2, 1));
    assert_eq!(view.rows[1].previous, Some(LineRef::new("b2", 2)));
    assert_eq!(view.next_commit, None);
}

#[test]
fn test_unknown_commit_and_file_are_user_facing() {
    let repo = repo(store());

    let err = repo.file_view("zz", "f").unwrap_err();
    assert!(matches!(err, Error::NotFound(Missing::Commit(_))), "{err}");

    let err = repo.file_view("a1", "nope").unwrap_err();
    assert!(matches!(err, Error::NotFound(Missing::File { .. })), "{err}");
    assert!(err.is_user_facing());
}

#[test]
fn test_content_disagreeing_with_the_index_is_malformed() {
    let store = store().with("b2", "f", "one\nthree\n");
    let err = repo(store).file_view("b2", "f").unwrap_err();
    assert!(matches!(err, Error::MalformedHistory { .. }), "{err}");
    assert!(!err.is_user_facing());
}

#[test]
fn test_registry_lookup_by_name() {
    let mut registry = BlameRegistry::default();
    registry.insert(repo(store()));
    assert_eq!(registry.sole().map(|r| r.name()), Some("demo"));
    assert!(registry.repo("demo").is_ok());
    assert!(registry.repo("other").err().is_some_and(|e| e.is_user_facing()));

    registry.insert(RepoIndex::new("empty", GitHistory::default(), Box::new(MemoryStore::default())));
    assert!(registry.sole().is_none());
}

const RECREATED: &str = "\
commit a1
--- /dev/null
+++ f
@@ -0,0 +1,3 @@
+one
+two
+three
commit b2
--- f
+++ /dev/null
@@ -1,3 +0,0 @@
-one
-two
-three
commit c3
--- /dev/null
+++ f
@@ -0,0 +1,2 @@
+again
+back
";

#[test]
fn test_diff_view_of_a_recreated_file() {
    let store = MemoryStore::default()
        .with("a1", "f", "one\ntwo\nthree\n")
        .commit("b2")
        .with("c3", "f", "again\nback\n");
    let history = GitHistory::build(parse_log_str(RECREATED).unwrap()).unwrap();
    let repo = RepoIndex::new("demo", history, Box::new(store));

    let deleted = repo.diff_view("b2", "f").unwrap();
    assert_eq!(deleted.rows.len(), 3);
    assert!(deleted.rows.iter().all(|r| r.kind == RowKind::Removed));

    let view = repo.diff_view("c3", "f").unwrap();
    assert_eq!(view.previous_commit.as_deref(), Some("b2"));
    let texts: Vec<&str> = view.rows.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["again", "back"]);
    assert!(view.rows.iter().all(|r| r.kind == RowKind::Added));
    assert!(view.rows.iter().all(|r| r.next == Some(Future::StillExists)));
}
