// src/history.rs

use crate::error::{Error, Missing, Result};
use crate::future;
use crate::indexer::step;
use crate::model::*;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Blame of one file at one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlame {
    pub blame: BlameVector,
    /// Same length and order as `blame`
    pub future: FutureVector,
}

/// Everything needed to lay out the diff one commit made to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffBlame {
    pub hunks: Vec<Hunk>,
    /// Attribution of the file before the commit, one entry per old line
    pub blame: BlameVector,
    /// Future of the file after the commit, one entry per new line
    pub future: FutureVector,
    pub previous_commit: Option<CommitHash>,
    pub next_commit: Option<CommitHash>,
}

/// The attribution state after every commit that touched one path.
#[derive(Debug)]
pub struct FileIndex {
    commits: FileHistory,
    snapshots: Vec<BlameSegments>,
    futures: Vec<FutureSegments>,
    positions: HashMap<CommitHash, usize>,
}

impl FileIndex {
    /// Folds `commits` from an empty file, keeping the state after each one.
    pub fn build(path: &str, commits: FileHistory) -> Result<Self> {
        let mut snapshots: Vec<BlameSegments> = Vec::with_capacity(commits.len());
        for commit in &commits {
            let before = snapshots.last().map_or(&[][..], |s| s.as_slice());
            let after = step(before, commit).map_err(|source| Error::MalformedHistory {
                path: path.to_string(),
                commit: commit.hash.to_string(),
                source,
            })?;
            snapshots.push(after);
        }

        let futures = future::attribute(path, &commits, &snapshots)?;
        let positions = commits
            .iter()
            .enumerate()
            .map(|(i, c)| (c.hash.clone(), i))
            .collect();

        Ok(FileIndex { commits, snapshots, futures, positions })
    }

    pub fn commits(&self) -> &[FileCommit] {
        &self.commits
    }

    /// Attribution state right after the commit at `position`
    pub fn segments(&self, position: usize) -> Option<&BlameSegments> {
        self.snapshots.get(position)
    }

    pub fn position(&self, commit: &str) -> Option<usize> {
        self.positions.get(commit).copied()
    }

    fn blame_at(&self, position: usize) -> FileBlame {
        FileBlame {
            blame: expand(&self.snapshots[position]),
            future: expand(&self.futures[position]),
        }
    }
}

/// Blame index for a whole repository. Immutable once built.
#[derive(Debug, Default)]
pub struct GitHistory {
    commits: HashMap<String, CommitInfo>,
    files: HashMap<String, FileIndex>,
}

impl GitHistory {
    pub fn build(log: ParsedLog) -> Result<Self> {
        Self::build_with_progress(log, ProgressBar::hidden())
    }

    /// Indexes every file of `log` in parallel. Any failure discards the lot.
    pub fn build_with_progress(mut log: ParsedLog, bar: ProgressBar) -> Result<Self> {
        let start = Instant::now();
        log.prune_empty();

        let files: Vec<(String, FileHistory)> = log.files.into_iter().collect();
        bar.reset();
        bar.set_length(files.len() as u64);
        bar.set_message("Indexing files");

        let files = files
            .into_par_iter()
            .progress_with(bar.clone())
            .map(|(path, history)| FileIndex::build(&path, history).map(|index| (path, index)))
            .collect::<Result<HashMap<_, _>>>()?;
        bar.finish_and_clear();

        let commits: HashMap<String, CommitInfo> = log
            .commits
            .into_iter()
            .map(|c| (c.hash.clone(), c))
            .collect();

        info!(
            "Indexed {} files across {} commits in {:.2?}",
            files.len(),
            commits.len(),
            start.elapsed()
        );
        Ok(GitHistory { commits, files })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub fn commit(&self, hash: &str) -> Option<&CommitInfo> {
        self.commits.get(hash)
    }

    /// Blame and future of `path` as `commit` left it.
    pub fn file_blame(&self, commit: &str, path: &str) -> Result<FileBlame> {
        let (file, position) = self.locate(commit, path)?;
        Ok(file.blame_at(position))
    }

    /// The hunks `commit` applied to `path`, with the attribution of the
    /// lines on either side of them.
    pub fn diff_blame(&self, commit: &str, path: &str) -> Result<DiffBlame> {
        let (file, position) = self.locate(commit, path)?;
        let (previous_commit, next_commit) = self.neighbors(commit, path)?;
        let blame = match position {
            0 => BlameVector::new(),
            p => expand(&file.snapshots[p - 1]),
        };
        Ok(DiffBlame {
            hunks: file.commits[position].hunks.clone(),
            blame,
            future: expand(&file.futures[position]),
            previous_commit,
            next_commit,
        })
    }

    /// The commits that touched `path` just before and just after `commit`.
    pub fn neighbors(
        &self,
        commit: &str,
        path: &str,
    ) -> Result<(Option<CommitHash>, Option<CommitHash>)> {
        let (file, position) = self.locate(commit, path)?;
        Ok((
            position.checked_sub(1).map(|p| file.commits[p].hash.clone()),
            file.commits.get(position + 1).map(|c| c.hash.clone()),
        ))
    }

    fn locate(&self, commit: &str, path: &str) -> Result<(&FileIndex, usize)> {
        let missing = || {
            debug!(commit, path, "no history entry");
            Error::NotFound(Missing::History { commit: commit.to_string(), path: path.to_string() })
        };
        let file = self.files.get(path).ok_or_else(missing)?;
        let position = file.position(commit).ok_or_else(missing)?;
        Ok((file, position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> GitHistory {
        let mut log = ParsedLog::default();
        for (hash, hunks) in [
            ("a1", vec![Hunk::new(0, 0, 1, 3)]),
            ("b2", vec![Hunk::new(1, 0, 2, 2), Hunk::new(2, 0, 5, 2)]),
            ("c3", vec![Hunk::new(1, 1, 1, 0), Hunk::new(4, 2, 3, 1)]),
        ] {
            log.commits.push(CommitInfo { hash: hash.to_string(), ..Default::default() });
            let hash: CommitHash = hash.into();
            for hunk in hunks {
                log.push_hunk(&hash, "README", hunk);
            }
        }
        GitHistory::build(log).unwrap()
    }

    #[test]
    fn file_blame_expands_the_snapshot() {
        let index = history();
        let result = index.file_blame("b2", "README").unwrap();
        assert_eq!(
            result.blame,
            vec![
                LineRef::new("a1", 1),
                LineRef::new("b2", 2),
                LineRef::new("b2", 3),
                LineRef::new("a1", 2),
                LineRef::new("b2", 5),
                LineRef::new("b2", 6),
                LineRef::new("a1", 3),
            ]
        );
        assert_eq!(result.future.len(), result.blame.len());
    }

    #[test]
    fn newest_lines_still_exist() {
        let result = history().file_blame("c3", "README").unwrap();
        assert_eq!(result.blame[2], LineRef::new("c3", 3));
        assert!(result.future.iter().all(|f| *f == Future::StillExists));
    }

    #[test]
    fn diff_blame_pairs_old_blame_with_new_future() {
        let result = history().diff_blame("c3", "README").unwrap();
        assert_eq!(result.hunks, vec![Hunk::new(1, 1, 1, 0), Hunk::new(4, 2, 3, 1)]);
        assert_eq!(result.blame.len(), 7);
        assert_eq!(result.future.len(), 5);
        assert_eq!(result.previous_commit.as_deref(), Some("b2"));
        assert_eq!(result.next_commit, None);
    }

    #[test]
    fn first_commit_has_no_previous() {
        let result = history().diff_blame("a1", "README").unwrap();
        assert!(result.blame.is_empty());
        assert_eq!(result.previous_commit, None);
        assert_eq!(result.next_commit.as_deref(), Some("b2"));
    }

    #[test]
    fn unknown_commit_or_path_is_not_found() {
        let index = history();
        for (commit, path) in [("zz", "README"), ("a1", "nope")] {
            let err = index.file_blame(commit, path).unwrap_err();
            assert!(err.is_user_facing(), "{err}");
        }
    }

    #[test]
    fn inconsistent_hunks_fail_the_build() {
        let mut log = ParsedLog::default();
        let a1: CommitHash = "a1".into();
        let b2: CommitHash = "b2".into();
        log.push_hunk(&a1, "x", Hunk::new(0, 0, 1, 2));
        log.push_hunk(&b2, "x", Hunk::new(1, 5, 0, 0));
        log.push_hunk(&a1, "y", Hunk::new(0, 0, 1, 1));
        match GitHistory::build(log) {
            Err(Error::MalformedHistory { path, commit, .. }) => {
                assert_eq!(path, "x");
                assert_eq!(commit, "b2");
            }
            other => panic!("expected malformed history, got {other:?}"),
        }
    }
}
