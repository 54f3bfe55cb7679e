use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Source of asset bytes (backgrounds, fonts, logos) by reference.
pub trait AssetSource: Send + Sync {
    fn load(&self, asset: &str) -> Result<Vec<u8>>;
}

/// Assets stored as files under a media root.
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to a path inside the media root.
    ///
    /// Only plain relative components are accepted.
    pub fn resolve(&self, asset: &str) -> Result<PathBuf> {
        let relative = Path::new(asset);
        let mut path = self.root.clone();
        let mut depth = 0;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(Error::Validation(format!(
                        "asset reference '{}' escapes the media root",
                        asset
                    )));
                }
            }
        }
        if depth == 0 {
            return Err(Error::Validation("empty asset reference".to_string()));
        }
        Ok(path)
    }
}

impl AssetSource for FsAssets {
    fn load(&self, asset: &str) -> Result<Vec<u8>> {
        let path = self.resolve(asset)?;
        debug!("Loading asset {}", path.display());
        Ok(fs::read(path)?)
    }
}

/// Assets held in memory, keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(asset.into(), bytes);
    }
}

impl AssetSource for MemoryAssets {
    fn load(&self, asset: &str) -> Result<Vec<u8>> {
        self.files.get(asset).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("asset not found: {}", asset),
            ))
        })
    }
}
