use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::debug;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArtifactKind {
    /// Types and codecs of one package.
    Module,
    /// The embedded runtime source.
    Runtime,
}

/// One generated file, held in memory until a sink writes it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Path relative to the output root.
    pub path:     PathBuf,
    pub contents: String,
    pub kind:     ArtifactKind,
}

/// Where generated artifacts end up.
pub trait OutputSink {
    fn write(&mut self, artifact: &Artifact) -> Result<(), Error>;

    fn write_all(&mut self, artifacts: &[Artifact]) -> Result<(), Error> {
        for artifact in artifacts {
            self.write(artifact)?;
        }
        Ok(())
    }
}

/// Collects artifacts in memory.
impl OutputSink for Vec<Artifact> {
    fn write(&mut self, artifact: &Artifact) -> Result<(), Error> {
        self.push(artifact.clone());
        Ok(())
    }
}

/// Writes artifacts below a root directory, creating it as needed. Files
/// whose contents are unchanged are left untouched so build tools do not
/// see spurious modifications.
#[derive(Debug, Clone)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSink { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for DirSink {
    fn write(&mut self, artifact: &Artifact) -> Result<(), Error> {
        let path = self.root.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;
        }
        if fs::read_to_string(&path).is_ok_and(|existing| existing == artifact.contents) {
            debug!("{} is up to date", path.display());
            return Ok(());
        }
        debug!("writing {}", path.display());
        fs::write(&path, &artifact.contents).map_err(|source| Error::Io { path, source })
    }
}
