use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    compiler,
    error::Error,
    importer::{FsSource, SchemaSource},
    output::Artifact,
};

/// Indentation used in emitted source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indent {
    Spaces(usize),
    Tabs,
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(4)
    }
}

impl Indent {
    pub fn unit(self) -> String {
        match self {
            Indent::Spaces(width) => " ".repeat(width),
            Indent::Tabs => "\t".to_string(),
        }
    }
}

/// Options for one compilation, usable as a builder or loaded from JSON.
///
/// ```
/// use protowire_compiler::{Config, Indent};
///
/// let config = Config::from_json(r#"{ "indent": "tabs", "strict_enums": true }"#).unwrap();
/// assert_eq!(config.indent, Indent::Tabs);
/// assert!(config.strict_enums);
/// assert!(config.emit_runtime);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search roots for schema files, tried in order.
    pub include_paths:    Vec<PathBuf>,
    pub indent:           Indent,
    /// Emit `protowire_runtime.rs` next to the generated modules.
    pub emit_runtime:     bool,
    /// Reject 64-bit field kinds.
    pub reduced_numerics: bool,
    /// Require enums to start at zero and forbid unannounced aliases.
    pub strict_enums:     bool,
    /// Also generate types declared in files only reached through imports.
    pub include_imports:  bool,
    /// Path generated code uses to reach the runtime.
    pub runtime_path:     String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            include_paths:    Vec::new(),
            indent:           Indent::default(),
            emit_runtime:     true,
            reduced_numerics: false,
            strict_enums:     false,
            include_imports:  true,
            runtime_path:     "::protowire_runtime".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn from_json(text: &str) -> Result<Config, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn include_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn indent(&mut self, indent: Indent) -> &mut Self {
        self.indent = indent;
        self
    }

    pub fn emit_runtime(&mut self, yes: bool) -> &mut Self {
        self.emit_runtime = yes;
        self
    }

    pub fn reduced_numerics(&mut self, yes: bool) -> &mut Self {
        self.reduced_numerics = yes;
        self
    }

    pub fn strict_enums(&mut self, yes: bool) -> &mut Self {
        self.strict_enums = yes;
        self
    }

    pub fn include_imports(&mut self, yes: bool) -> &mut Self {
        self.include_imports = yes;
        self
    }

    pub fn runtime_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.runtime_path = path.into();
        self
    }

    /// Compiles `protos`, located through the include paths, into artifacts.
    pub fn compile<I, N>(&self, protos: I) -> Result<Vec<Artifact>, Error>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let source = FsSource::new(self.include_paths.iter().cloned());
        self.compile_with(source, protos)
    }

    /// Like [`Config::compile`] but reads schema text through `source`.
    pub fn compile_with<S, I, N>(&self, source: S, protos: I) -> Result<Vec<Artifact>, Error>
    where
        S: SchemaSource,
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let collection = compiler::build_collection(self, source, protos)?;
        Ok(compiler::generate(&collection, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mut config = Config::new();
        config
            .include_path("protos")
            .indent(Indent::Spaces(2))
            .emit_runtime(false)
            .reduced_numerics(true)
            .include_imports(false)
            .runtime_path("crate::rt");
        assert_eq!(config.include_paths, vec![PathBuf::from("protos")]);
        assert_eq!(config.indent.unit(), "  ");
        assert!(!config.emit_runtime && config.reduced_numerics && !config.include_imports);
        assert_eq!(config.runtime_path, "crate::rt");
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = Config::new();
        config.indent(Indent::Spaces(8)).strict_enums(true);
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&text).unwrap(), config);
        assert!(text.contains(r#""indent":{"spaces":8}"#), "{}", text);
    }

    #[test]
    fn test_json_rejects_unknown_shapes() {
        let err = Config::from_json(r#"{ "indent": "sideways" }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
