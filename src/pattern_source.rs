//! Restartable-looking, but not actually restartable, iterator over a
//! pattern directory.
//!
//! Owns the directory handle itself and an explicit exhaustion flag, rather
//! than relying on static iterator state: once [`PatternSource::next`]
//! returns `None` it stays `None` forever, and the underlying directory
//! handle is read exactly once to exhaustion.

use std::fs::ReadDir;
use std::io::Result;
use std::path::{Path, PathBuf};

pub struct PatternSource {
    entries: ReadDir,
    exhausted: bool,
}

impl PatternSource {
    pub fn open(dir: &Path) -> Result<Self> {
        Ok(Self {
            entries: std::fs::read_dir(dir)?,
            exhausted: false,
        })
    }

    /// Return the next non-dotfile entry, or `None` once the directory is
    /// exhausted. Idempotent: calling again after `None` keeps returning
    /// `None`.
    pub fn next(&mut self) -> Result<Option<PathBuf>> {
        if self.exhausted {
            return Ok(None);
        }

        loop {
            match self.entries.next() {
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Some(Err(err)) => return Err(err),
                Some(Ok(entry)) => {
                    let name = entry.file_name();

                    if name.to_string_lossy().starts_with('.') {
                        continue;
                    }

                    return Ok(Some(entry.path()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn skips_dotfiles_and_yields_each_name_once() {
        let dir = tempfile::tempdir().unwrap();
        for name in [".hidden", "a", "b", "c"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let mut source = PatternSource::open(dir.path()).unwrap();
        let mut seen = HashSet::new();

        while let Some(path) = source.next().unwrap() {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(!name.starts_with('.'));
            assert!(seen.insert(name), "yielded the same filename twice");
        }

        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn stays_exhausted_once_done() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("only"), b"x").unwrap();

        let mut source = PatternSource::open(dir.path()).unwrap();
        assert!(source.next().unwrap().is_some());
        assert!(source.next().unwrap().is_none());
        assert!(source.next().unwrap().is_none());
    }
}
