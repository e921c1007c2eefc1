use tracing::{debug, info};

use crate::{
    collection::Collection,
    config::Config,
    error::Error,
    importer::{resolve_imports, MemorySource, SchemaSource},
    output::Artifact,
    resolver::resolve_types,
};

pub use crate::gen_rust::generate;

/// Parses `protos` with everything they import, then resolves and checks
/// every type reference. The returned collection is ready for generation.
pub fn build_collection<S, I, N>(config: &Config, source: S, protos: I) -> Result<Collection, Error>
where
    S: SchemaSource,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut collection = resolve_imports(source, protos)?;
    debug!(
        "loaded {} files, {} messages, {} enums",
        collection.files.len(),
        collection.messages.len(),
        collection.enums.len()
    );
    resolve_types(&mut collection, config)?;
    info!("Resolved {} files", collection.files.len());
    Ok(collection)
}

/// Compiles a single in-memory schema named `name`.
/// Returns `Err(Error)` if tokenization, parsing or resolution fails.
pub fn compile_str(name: &str, text: &str, config: &Config) -> Result<Vec<Artifact>, Error> {
    let mut source = MemorySource::new();
    source.add(name, text);
    config.compile_with(source, [name])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ArtifactKind;

    #[test]
    fn test_compile_str() {
        let artifacts = compile_str(
            "point.proto",
            "syntax = \"proto3\"; package geo; message Point { sint32 x = 1; }",
            &Config::default(),
        )
        .unwrap();
        let kinds: Vec<_> = artifacts.iter().map(|a| (a.path.to_string_lossy().into_owned(), a.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("geo.rs".to_string(), ArtifactKind::Module),
                ("protowire_runtime.rs".to_string(), ArtifactKind::Runtime),
            ]
        );
        assert!(artifacts[0].contents.contains("bb.write_sint32(self.x);"));
    }

    #[test]
    fn test_errors_abort_generation() {
        let err = compile_str("bad.proto", "message M { Missing m = 1; }", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::TypeResolution { .. }), "{:?}", err);

        let err = compile_str("bad.proto", "message M { int32 a = 1; int32 b = 1; }", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::FieldNumber { number: 1, .. }), "{:?}", err);
    }

    #[test]
    fn test_reduced_numerics() {
        let mut config = Config::default();
        config.reduced_numerics(true);
        let err = compile_str("wide.proto", "message M { optional int64 a = 1; }", &config).unwrap_err();
        assert!(matches!(err, Error::TypeResolution { .. }), "{:?}", err);
        assert!(compile_str("narrow.proto", "message M { optional int32 a = 1; }", &config).is_ok());
    }
}
