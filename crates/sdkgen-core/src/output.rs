use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use regex::Regex;
use tempfile::TempDir;

use crate::GeneratedFile;
use crate::error::GeneratorError;

/// Output paths that must never be written, from the `ignores` config list.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    patterns: Vec<Regex>,
}

impl IgnoreSet {
    pub fn new(patterns: &[String]) -> Result<Self, GeneratorError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| GeneratorError::InvalidIgnorePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Patterns search anywhere in the `/`-separated destination path.
    pub fn is_ignored(&self, dest: &Path) -> bool {
        let normalized = dest.to_string_lossy().replace('\\', "/");
        self.patterns.iter().any(|re| re.is_match(&normalized))
    }
}

#[derive(Debug)]
struct StagedEntry {
    staged: PathBuf,
    dest: PathBuf,
}

/// Files written to a scratch directory and moved to their destinations only
/// by [`StagedOutput::promote`]. Dropping it without promoting removes
/// everything that was staged.
#[derive(Debug)]
pub struct StagedOutput {
    dir: TempDir,
    entries: Vec<StagedEntry>,
    ignores: IgnoreSet,
}

impl StagedOutput {
    /// Create the staging directory beside `anchor` so promotion is a rename on
    /// the same filesystem. Missing parents of `anchor` are created; `anchor`
    /// itself is not.
    pub fn new(anchor: &Path, ignores: IgnoreSet) -> Result<Self, GeneratorError> {
        let parent = match anchor.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| GeneratorError::io(&parent, e))?;
        let dir = tempfile::Builder::new()
            .prefix(".sdkgen-staging-")
            .tempdir_in(&parent)
            .map_err(|e| GeneratorError::io(&parent, e))?;
        debug!("staging in {}", dir.path().display());
        Ok(Self {
            dir,
            entries: Vec::new(),
            ignores,
        })
    }

    /// Scratch location inside the staging area that is never promoted.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("_scratch").join(name)
    }

    /// Register `root/relative` for promotion and return where to write it in
    /// staging, or `None` when the destination is ignored.
    pub fn reserve(
        &mut self,
        root: &Path,
        relative: &str,
    ) -> Result<Option<PathBuf>, GeneratorError> {
        let dest = root.join(relative);
        if self.ignores.is_ignored(&dest) {
            info!("ignoring {}", dest.display());
            return Ok(None);
        }
        let staged = self
            .dir
            .path()
            .join(format!("unit-{}", self.entries.len()))
            .join(relative);
        if let Some(parent) = staged.parent() {
            fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e))?;
        }
        self.entries.push(StagedEntry {
            staged: staged.clone(),
            dest,
        });
        Ok(Some(staged))
    }

    /// Write a generated file under `root` into staging.
    pub fn stage(&mut self, root: &Path, file: &GeneratedFile) -> Result<bool, GeneratorError> {
        match self.reserve(root, &file.path)? {
            Some(staged) => {
                fs::write(&staged, &file.content).map_err(|e| GeneratorError::io(&staged, e))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move every staged file to its destination, returning the written paths.
    pub fn promote(self) -> Result<Vec<PathBuf>, GeneratorError> {
        let mut written = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !entry.staged.exists() {
                continue;
            }
            if let Some(parent) = entry.dest.parent() {
                fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e))?;
            }
            if fs::rename(&entry.staged, &entry.dest).is_err() {
                // Destination on another filesystem.
                fs::copy(&entry.staged, &entry.dest)
                    .map_err(|e| GeneratorError::io(&entry.dest, e))?;
            }
            written.push(entry.dest.clone());
        }
        info!("promoted {} file(s)", written.len());
        Ok(written)
    }
}
