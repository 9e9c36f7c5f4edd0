// src/lib.rs

//! Line-level blame for whole repositories, computed once up front.
//!
//! A repository's first-parent history is read either from git directly or
//! from a saved `git log` dump, and every file's attribution is folded
//! forward through the hunks that touched it. The index then answers, for
//! any commit and path, which commit introduced each line and which later
//! commit (if any) changes it next.

pub mod analyzer;
pub mod config;
pub mod diff_view;
pub mod error;
pub mod future;
pub mod history;
pub mod indexer;
pub mod model;
pub mod parser;
pub mod registry;
pub mod renderer;

pub use error::{Error, Missing, Result, StepError};
pub use history::{DiffBlame, FileBlame, GitHistory};
pub use model::{CommitHash, FileCommit, Future, Hunk, LineRef};
pub use registry::{BlameRegistry, BlameView, ObjectStore, RepoIndex};
