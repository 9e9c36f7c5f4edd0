// src/analyzer.rs

use crate::error::{Missing, Result};
use crate::model::*;
use crate::registry::ObjectStore;
use chrono::{FixedOffset, TimeZone};
use git2::{Commit, Diff, DiffOptions, ErrorCode, Oid, Repository, Sort};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Reads history and file contents straight out of a git repository.
///
/// Only the path is kept; `git2::Repository` is not `Sync`, so each call
/// opens the repository afresh.
#[derive(Debug, Clone)]
pub struct GitStore {
    path: PathBuf,
}

impl GitStore {
    pub fn new(path: &Path) -> Self {
        GitStore { path: path.to_path_buf() }
    }

    fn open(&self) -> Result<Repository> {
        Ok(Repository::open(&self.path)?)
    }

    /// Walks the first-parent history up to `revision`, oldest first, and
    /// collects every hunk of every commit with no context lines.
    pub fn analyze(&self, revision: &str, bar: &ProgressBar) -> Result<ParsedLog> {
        let repo = self.open()?;
        debug!("Walking {} from {}", self.path.display(), revision);

        let tip = repo.revparse_single(revision)?.peel_to_commit()?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push(tip.id())?;
        revwalk.simplify_first_parent()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        let oids = revwalk.collect::<std::result::Result<Vec<Oid>, _>>()?;

        bar.reset();
        bar.set_length(oids.len() as u64);
        bar.set_message("Reading commits");

        let mut log = ParsedLog::default();
        for oid in oids {
            let commit = repo.find_commit(oid)?;
            let parent_tree = match commit.parent(0) {
                Ok(parent) => Some(parent.tree()?),
                Err(_) => None,
            };
            let current_tree = commit.tree()?;

            let mut diff_opts = DiffOptions::new();
            diff_opts.context_lines(0);
            diff_opts.interhunk_lines(0);
            diff_opts.include_untracked(false);
            diff_opts.ignore_filemode(true);

            let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&current_tree), Some(&mut diff_opts))?;
            collect_hunks(&diff, &Arc::from(oid.to_string()), &mut log)?;
            log.commits.push(commit_info(&commit));

            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(log)
    }
}

fn collect_hunks(diff: &Diff<'_>, hash: &CommitHash, log: &mut ParsedLog) -> Result<()> {
    diff.foreach(
        &mut |_, _| true,
        None,
        Some(&mut |delta, hunk| {
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            if let Some(path) = path {
                let hunk = Hunk {
                    old_start: hunk.old_start() as usize,
                    old_length: hunk.old_lines() as usize,
                    new_start: hunk.new_start() as usize,
                    new_length: hunk.new_lines() as usize,
                };
                log.push_hunk(hash, &path.to_string_lossy(), hunk);
            }
            true
        }),
        None,
    )?;
    Ok(())
}

/// Author, committer date and summary, formatted the way `git log` prints them.
pub fn commit_info(commit: &Commit) -> CommitInfo {
    let author = commit.author();
    let time = commit.time();
    let date = FixedOffset::east_opt(time.offset_minutes() * 60)
        .and_then(|offset| offset.timestamp_opt(time.seconds(), 0).single())
        .map(|date| date.format("%Y-%m-%d %H:%M:%S %z").to_string())
        .unwrap_or_default();

    CommitInfo {
        hash: commit.id().to_string(),
        author: format!(
            "{} <{}>",
            author.name().unwrap_or("Unknown"),
            author.email().unwrap_or("")
        ),
        date,
        subject: commit.summary().unwrap_or("").to_string(),
    }
}

impl ObjectStore for GitStore {
    fn resolve(&self, revision: &str) -> Result<CommitInfo> {
        let repo = self.open()?;
        let commit = repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| Missing::Commit(revision.to_string()))?;
        Ok(commit_info(&commit))
    }

    fn blob(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let repo = self.open()?;
        let commit = Oid::from_str(commit)
            .and_then(|oid| repo.find_commit(oid))
            .map_err(|_| Missing::Commit(commit.to_string()))?;
        let entry = match commit.tree()?.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object = entry.to_object(&repo)?;
        Ok(object.as_blob().map(|blob| blob.content().to_vec()))
    }
}
