use std::{fmt, path::PathBuf};

use serde::Serialize;

use crate::error::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Syntax {
    Proto2,
    Proto3,
}

/// One parsed schema file, before any merging or resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaFile {
    pub path:     PathBuf,
    pub syntax:   Syntax,
    pub package:  Option<String>,
    pub imports:  Vec<Import>,
    pub options:  Vec<OptionEntry>,
    pub messages: Vec<MessageDecl>,
    pub enums:    Vec<EnumDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportKind {
    Default,
    Public,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub path:     String,
    pub kind:     ImportKind,
    pub location: Location,
}

/// A literal appearing on the right-hand side of an option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    Ident(String),
    Integer(i128),
    Float(f64),
    Str(String),
    /// A string literal that is not valid UTF-8; only usable as a bytes value.
    Bytes(Vec<u8>),
    /// `{ ... }` text-format value, kept as raw token text.
    Aggregate(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Ident(value) | Constant::Aggregate(value) => write!(f, "{}", value),
            Constant::Integer(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{}", value),
            Constant::Str(value) => write!(f, "{:?}", value),
            Constant::Bytes(value) => write!(f, "\"{}\"", value.escape_ascii()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionEntry {
    pub name:     String,
    pub value:    Constant,
    pub location: Location,
}

/// Finds the last option named `name`; later declarations override earlier ones.
pub fn find_option<'a>(options: &'a [OptionEntry], name: &str) -> Option<&'a OptionEntry> {
    options.iter().rev().find(|option| option.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 15] = [
        ScalarKind::Double,
        ScalarKind::Float,
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
        ScalarKind::Sint32,
        ScalarKind::Sint64,
        ScalarKind::Fixed32,
        ScalarKind::Fixed64,
        ScalarKind::Sfixed32,
        ScalarKind::Sfixed64,
        ScalarKind::Bool,
        ScalarKind::String,
        ScalarKind::Bytes,
    ];

    pub fn from_name(name: &str) -> Option<ScalarKind> {
        ScalarKind::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// The keyword used for this kind in schema text.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Double   => "double",
            ScalarKind::Float    => "float",
            ScalarKind::Int32    => "int32",
            ScalarKind::Int64    => "int64",
            ScalarKind::Uint32   => "uint32",
            ScalarKind::Uint64   => "uint64",
            ScalarKind::Sint32   => "sint32",
            ScalarKind::Sint64   => "sint64",
            ScalarKind::Fixed32  => "fixed32",
            ScalarKind::Fixed64  => "fixed64",
            ScalarKind::Sfixed32 => "sfixed32",
            ScalarKind::Sfixed64 => "sfixed64",
            ScalarKind::Bool     => "bool",
            ScalarKind::String   => "string",
            ScalarKind::Bytes    => "bytes",
        }
    }

    /// Kinds that need 64-bit arithmetic on the target.
    pub fn is_64_bit(self) -> bool {
        matches!(
            self,
            ScalarKind::Double
                | ScalarKind::Int64
                | ScalarKind::Uint64
                | ScalarKind::Sint64
                | ScalarKind::Fixed64
                | ScalarKind::Sfixed64
        )
    }

    /// Kinds protobuf allows as map keys.
    pub fn is_valid_map_key(self) -> bool {
        !matches!(self, ScalarKind::Double | ScalarKind::Float | ScalarKind::Bytes)
    }
}

/// The type written in a field declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// A message or enum name, relative or fully qualified (leading `.`).
    Named(String),
    Map {
        key:   Box<FieldType>,
        value: Box<FieldType>,
    },
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(kind) => write!(f, "{}", kind.name()),
            FieldType::Named(name) => write!(f, "{}", name),
            FieldType::Map { key, value } => write!(f, "map<{}, {}>", key, value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    /// No label: singular field with implicit presence.
    Implicit,
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name:     String,
    pub location: Location,
    pub label:    Label,
    pub type_:    FieldType,
    pub number:   i128,
    pub options:  Vec<OptionEntry>,
    pub oneof:    Option<String>,
}

/// An inclusive range of field or enum numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberRange {
    pub start: i128,
    pub end:   i128,
}

impl NumberRange {
    pub fn contains(&self, number: i128) -> bool {
        self.start <= number && number <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Reserved {
    Range(NumberRange),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDecl {
    pub name:       String,
    pub location:   Location,
    pub fields:     Vec<FieldDecl>,
    pub messages:   Vec<MessageDecl>,
    pub enums:      Vec<EnumDecl>,
    pub reserved:   Vec<Reserved>,
    pub extensions: Vec<NumberRange>,
    pub options:    Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValueDecl {
    pub name:     String,
    pub location: Location,
    pub number:   i128,
    pub options:  Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name:     String,
    pub location: Location,
    pub values:   Vec<EnumValueDecl>,
    pub reserved: Vec<Reserved>,
    pub options:  Vec<OptionEntry>,
}
