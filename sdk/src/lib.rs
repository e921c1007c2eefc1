//! protowire
//!
//! Entry point for build scripts and tools working with protowire schemas.
//!
//! - `compile_protos` compiles schemas and writes the generated modules
//! - `collection_to_json` dumps a resolved schema set for inspection
//! - the compiler and runtime APIs, re-exported

use std::path::{Path, PathBuf};

use tracing::info;

pub use protowire_compiler::{
    Artifact, ArtifactKind, Collection, Config, DirSink, Error, FsSource, Indent, MemorySource,
    OutputSink, SchemaSource,
};
pub use protowire_runtime::{ByteBuffer, ByteBufferMut, DecodeError, Message, WireType};

/// Compiles `protos`, searching `includes` in order, and writes the result
/// below `out_dir`. Returns the paths of the written files.
pub fn compile_protos<P, I>(protos: &[P], includes: &[I], out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error>
where
    P: AsRef<str>,
    I: AsRef<Path>,
{
    let mut config = Config::new();
    for include in includes {
        config.include_path(include.as_ref());
    }
    compile_with_config(&config, protos, out_dir)
}

/// Like [`compile_protos`] with every option taken from `config`.
pub fn compile_with_config<P>(config: &Config, protos: &[P], out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error>
where
    P: AsRef<str>,
{
    let artifacts = config.compile(protos)?;
    let mut sink = DirSink::new(out_dir.as_ref());
    sink.write_all(&artifacts)?;
    info!("Generated {} files in {}", artifacts.len(), out_dir.as_ref().display());
    Ok(artifacts.iter().map(|artifact| sink.root().join(&artifact.path)).collect())
}

/// Resolves `protos` and renders the resulting collection as pretty-printed JSON.
pub fn collection_to_json<P>(config: &Config, protos: &[P]) -> Result<String, Error>
where
    P: AsRef<str>,
{
    let source = FsSource::new(config.include_paths.iter().cloned());
    let collection = protowire_compiler::build_collection(config, source, protos)?;
    Ok(serde_json::to_string_pretty(&collection)?)
}

pub mod compiler {
    pub use protowire_compiler::*;
}

pub mod runtime {
    pub use protowire_runtime::*;
}
