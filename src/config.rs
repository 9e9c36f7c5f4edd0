// src/config.rs

//! Which repositories get a blame index, and where their history comes from.
//!
//! ```toml
//! [[repository]]
//! name = "livegrep"
//! path = "/src/livegrep"
//! blame = "git"           # walk the repository itself
//!
//! [[repository]]
//! name = "linux"
//! path = "/src/linux"
//! blame = "linux.log"     # a saved `git log` dump, relative to this file
//! revision = "master"
//! ```
//!
//! Repositories without a `blame` entry are listed but not indexed.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub blame: Option<BlameSource>,
    #[serde(default = "default_revision")]
    pub revision: String,
}

/// Where a repository's history is read from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum BlameSource {
    /// Walk the repository with libgit2
    Git,
    /// Parse a saved `git log` dump
    LogFile(PathBuf),
}

impl From<String> for BlameSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "git" => BlameSource::Git,
            _ => BlameSource::LogFile(PathBuf::from(value)),
        }
    }
}

fn default_revision() -> String {
    "HEAD".to_string()
}

impl Config {
    /// Loads a config file; relative log paths are taken from the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&text)?;
        let base = path.parent().unwrap_or(Path::new(""));
        for repo in &mut config.repositories {
            if let Some(BlameSource::LogFile(log)) = &mut repo.blame {
                if log.is_relative() {
                    *log = base.join(log.as_path());
                }
            }
        }
        debug!("Loaded {} repositories from {}", config.repositories.len(), path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// A single git repository, named after its directory.
    pub fn single(path: &Path) -> Self {
        let name = path
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| path.display().to_string());
        Config {
            repositories: vec![RepositoryConfig {
                name,
                path: path.to_path_buf(),
                blame: Some(BlameSource::Git),
                revision: default_revision(),
            }],
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for repo in &self.repositories {
            if repo.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "repository at {} has an empty name",
                    repo.path.display()
                )));
            }
            if !seen.insert(repo.name.as_str()) {
                return Err(Error::Config(format!("repository {:?} is listed twice", repo.name)));
            }
        }
        Ok(())
    }

    pub fn blame_enabled(&self) -> impl Iterator<Item = &RepositoryConfig> {
        self.repositories.iter().filter(|r| r.blame.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_repositories() {
        let config = Config::from_toml(
            r#"
            [[repository]]
            name = "one"
            path = "/src/one"
            blame = "git"

            [[repository]]
            name = "two"
            path = "/src/two"
            blame = "dumps/two.log"
            revision = "main"

            [[repository]]
            name = "three"
            path = "/src/three"
            "#,
        )
        .unwrap();

        assert_eq!(config.repositories.len(), 3);
        assert_eq!(config.repositories[0].blame, Some(BlameSource::Git));
        assert_eq!(config.repositories[0].revision, "HEAD");
        assert_eq!(
            config.repositories[1].blame,
            Some(BlameSource::LogFile(PathBuf::from("dumps/two.log")))
        );
        assert_eq!(config.repositories[1].revision, "main");

        let enabled: Vec<&str> = config.blame_enabled().map(|r| r.name.as_str()).collect();
        assert_eq!(enabled, vec!["one", "two"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Config::from_toml(
            r#"
            [[repository]]
            name = "one"
            path = "/a"
            [[repository]]
            name = "one"
            path = "/b"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml("[[repository]]\nname = \"x\"\npath = \"/x\"\nblme = \"git\"\n");
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn log_paths_are_relative_to_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blame.toml");
        fs::write(&path, "[[repository]]\nname = \"x\"\npath = \"/x\"\nblame = \"x.log\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.repositories[0].blame,
            Some(BlameSource::LogFile(dir.path().join("x.log")))
        );
    }
}
