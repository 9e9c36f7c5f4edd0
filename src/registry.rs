// src/registry.rs

//! Per-repository blame indexes, built once at startup, and the two views
//! served from them.

use crate::analyzer::GitStore;
use crate::config::{BlameSource, Config, RepositoryConfig};
use crate::diff_view::{DiffRow, DiffViewBuilder, RowKind};
use crate::error::{Error, Missing, Result, StepError};
use crate::history::GitHistory;
use crate::model::CommitInfo;
use crate::parser::parse_log;
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use tracing::{debug, info};

/// Source of commit metadata and file contents, used only for display.
pub trait ObjectStore: Send + Sync {
    /// Resolves a revision name to a commit.
    fn resolve(&self, revision: &str) -> Result<CommitInfo>;

    /// Content of `path` at `commit`, or `None` if the file does not exist there.
    fn blob(&self, commit: &str, path: &str) -> Result<Option<Vec<u8>>>;
}

/// A rendered blame or diff view
#[derive(Debug, Clone, Serialize)]
pub struct BlameView {
    pub commit: CommitInfo,
    pub path: String,
    /// The commit before this one that touched `path`
    pub previous_commit: Option<String>,
    /// The commit after this one that touched `path`
    pub next_commit: Option<String>,
    pub rows: Vec<DiffRow>,
}

/// One repository's index together with the store its content comes from.
pub struct RepoIndex {
    name: String,
    history: GitHistory,
    store: Box<dyn ObjectStore>,
}

impl RepoIndex {
    pub fn new(name: &str, history: GitHistory, store: Box<dyn ObjectStore>) -> Self {
        RepoIndex { name: name.to_string(), history, store }
    }

    /// Reads and indexes a repository's history. `None` if blame is not enabled.
    pub fn build(repo: &RepositoryConfig, bar: &ProgressBar) -> Result<Option<Self>> {
        let Some(source) = &repo.blame else {
            debug!("Skipping {}: not configured for blame", repo.name);
            return Ok(None);
        };
        info!("Building blame index for {}", repo.name);
        let start = Instant::now();

        let store = GitStore::new(&repo.path);
        let log = match source {
            BlameSource::Git => store.analyze(&repo.revision, bar)?,
            BlameSource::LogFile(path) => parse_log(BufReader::new(File::open(path)?))?,
        };
        let history = GitHistory::build_with_progress(log, bar.clone())?;

        info!("Built blame index for {} in {:.2?}", repo.name, start.elapsed());
        Ok(Some(RepoIndex::new(&repo.name, history, Box::new(store))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn history(&self) -> &GitHistory {
        &self.history
    }

    /// Every line of `path` as of `revision`, with where it came from and where it goes.
    pub fn file_view(&self, revision: &str, path: &str) -> Result<BlameView> {
        let start = Instant::now();
        let commit = self.describe(revision)?;
        let lines = self.lines(&commit.hash, path)?.ok_or_else(|| Missing::File {
            commit: commit.hash.clone(),
            path: path.to_string(),
        })?;

        let result = self.history.file_blame(&commit.hash, path)?;
        if lines.len() != result.blame.len() {
            return Err(self.mismatch(&commit, path, result.blame.len(), lines.len()));
        }

        let rows = result
            .blame
            .into_iter()
            .zip(result.future)
            .zip(lines)
            .enumerate()
            .map(|(i, ((previous, next), text))| DiffRow {
                kind: RowKind::Context,
                previous: Some(previous),
                next: Some(next),
                old_line: i + 1,
                new_line: i + 1,
                text,
            })
            .collect();

        let view = self.view(commit, path, rows)?;
        debug!("Blame of {} took {:.2?}", path, start.elapsed());
        Ok(view)
    }

    /// The change `revision` made to `path`, line by line.
    pub fn diff_view(&self, revision: &str, path: &str) -> Result<BlameView> {
        let start = Instant::now();
        let commit = self.describe(revision)?;
        let result = self.history.diff_blame(&commit.hash, path)?;

        let new_lines = match self.lines(&commit.hash, path)? {
            Some(lines) => lines,
            // deleted by this commit
            None if result.future.is_empty() => Vec::new(),
            None => {
                return Err(Missing::File { commit: commit.hash.clone(), path: path.to_string() }.into())
            }
        };
        let old_lines = match &result.previous_commit {
            Some(previous) => match self.lines(previous, path)? {
                Some(lines) => lines,
                // re-created after the previous commit deleted it
                None if result.blame.is_empty() => Vec::new(),
                None => {
                    return Err(Missing::File { commit: previous.to_string(), path: path.to_string() }.into())
                }
            },
            None => Vec::new(),
        };

        let rows = DiffViewBuilder::new(&result.blame, &result.future, &old_lines, &new_lines)
            .and_then(|builder| builder.build(&result.hunks))
            .map_err(|source| Error::MalformedHistory {
                path: path.to_string(),
                commit: commit.hash.clone(),
                source,
            })?;

        let view = self.view(commit, path, rows)?;
        debug!("Diff of {} took {:.2?}", path, start.elapsed());
        Ok(view)
    }

    /// Resolves `revision`, filling metadata the store left blank from the indexed log.
    fn describe(&self, revision: &str) -> Result<CommitInfo> {
        let mut commit = self.store.resolve(revision)?;
        if let Some(indexed) = self.history.commit(&commit.hash) {
            for (field, known) in [
                (&mut commit.author, &indexed.author),
                (&mut commit.date, &indexed.date),
                (&mut commit.subject, &indexed.subject),
            ] {
                if field.is_empty() {
                    field.clone_from(known);
                }
            }
        }
        Ok(commit)
    }

    fn view(&self, commit: CommitInfo, path: &str, rows: Vec<DiffRow>) -> Result<BlameView> {
        let (previous, next) = self.history.neighbors(&commit.hash, path)?;
        Ok(BlameView {
            commit,
            path: path.to_string(),
            previous_commit: previous.map(|h| h.to_string()),
            next_commit: next.map(|h| h.to_string()),
            rows,
        })
    }

    fn lines(&self, commit: &str, path: &str) -> Result<Option<Vec<String>>> {
        Ok(self.store.blob(commit, path)?.map(|bytes| split_lines(&String::from_utf8_lossy(&bytes))))
    }

    fn mismatch(&self, commit: &CommitInfo, path: &str, expected: usize, actual: usize) -> Error {
        Error::MalformedHistory {
            path: path.to_string(),
            commit: commit.hash.clone(),
            source: StepError::Mismatch { expected, actual },
        }
    }
}

/// Splits file content into lines, ignoring one trailing newline.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n').map(str::to_string).collect()
}

/// Every blame-enabled repository, looked up by name.
#[derive(Default)]
pub struct BlameRegistry {
    repos: HashMap<String, RepoIndex>,
}

impl BlameRegistry {
    /// Indexes every blame-enabled repository in `config`. Nothing is
    /// returned unless all of them succeed.
    pub fn build(config: &Config, bar: &ProgressBar) -> Result<Self> {
        debug!(
            "{} of {} repositories have blame enabled",
            config.blame_enabled().count(),
            config.repositories.len()
        );
        let mut registry = BlameRegistry::default();
        for repo in &config.repositories {
            if let Some(index) = RepoIndex::build(repo, bar)? {
                registry.insert(index);
            }
        }
        Ok(registry)
    }

    pub fn insert(&mut self, index: RepoIndex) {
        self.repos.insert(index.name.clone(), index);
    }

    pub fn repo(&self, name: &str) -> Result<&RepoIndex> {
        self.repos
            .get(name)
            .ok_or_else(|| Missing::Repository(name.to_string()).into())
    }

    /// The only repository, if exactly one is indexed
    pub fn sole(&self) -> Option<&RepoIndex> {
        match self.repos.len() {
            1 => self.repos.values().next(),
            _ => None,
        }
    }

    pub fn repos(&self) -> impl Iterator<Item = &RepoIndex> {
        self.repos.values()
    }
}
