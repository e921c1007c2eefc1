//! protowire-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.proto` schema files (proto2 and proto3),
//!  2) Import resolution over include paths, parsing each file exactly once,
//!  3) Type resolution and validation (names, field numbers, enums, defaults),
//!  4) Code generation (`generate` → one Rust module per package),
//!  5) Output sinks writing the generated artifacts, and the `Error` type.

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod collection;
pub mod importer;
pub mod resolver;
pub mod wire;
pub mod gen_rust;
pub mod config;
pub mod output;
pub mod compiler;

pub use collection::Collection;
pub use compiler::{build_collection, compile_str};
pub use config::{Config, Indent};
pub use error::{Error, Location};
pub use gen_rust::generate;
pub use importer::{resolve_imports, FsSource, ImportContext, MemorySource, SchemaSource};
pub use output::{Artifact, ArtifactKind, DirSink, OutputSink};
pub use parser::parse_schema;
pub use protowire_runtime::RUNTIME_SOURCE;
pub use resolver::resolve_types;
pub use tokenizer::tokenize_schema;
pub use wire::FieldCodec;
