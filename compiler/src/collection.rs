use std::{
    collections::BTreeSet,
    path::PathBuf,
};

use protowire_runtime::WireType;
use serde::{Serialize, Serializer};

use crate::{
    error::Location,
    types::{
        Constant, EnumDecl, FieldDecl, FieldType, ImportKind, Label, MessageDecl, NumberRange,
        OptionEntry, Reserved, ScalarKind, SchemaFile, Syntax,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EnumId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeRef {
    Unresolved(String),
    Message(MessageId),
    Enum(EnumId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Named(TypeRef),
    Map {
        key:   Box<FieldKind>,
        value: Box<FieldKind>,
    },
}

impl FieldKind {
    fn from_decl(type_: FieldType) -> FieldKind {
        match type_ {
            FieldType::Scalar(kind) => FieldKind::Scalar(kind),
            FieldType::Named(name) => FieldKind::Named(TypeRef::Unresolved(name)),
            FieldType::Map { key, value } => FieldKind::Map {
                key:   Box::new(FieldKind::from_decl(*key)),
                value: Box::new(FieldKind::from_decl(*value)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileImport {
    pub file: FileId,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    /// The name the file was first requested under.
    pub name:     String,
    pub path:     PathBuf,
    pub syntax:   Syntax,
    pub package:  Option<String>,
    pub imports:  Vec<FileImport>,
    /// Set while the file has only been reached through imports.
    pub imported: bool,
    pub messages: Vec<MessageId>,
    pub enums:    Vec<EnumId>,
    pub options:  Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name:      String,
    pub location:  Location,
    pub number:    i128,
    pub label:     Label,
    pub kind:      FieldKind,
    pub oneof:     Option<String>,
    pub options:   Vec<OptionEntry>,
    /// Filled in by the type resolver from here on.
    #[serde(serialize_with = "serialize_wire_type")]
    pub wire_type: Option<WireType>,
    pub packed:    bool,
    pub default:   Option<Constant>,
    /// Singular message field that must be boxed to break a type cycle.
    pub boxed:     bool,
}

impl Field {
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    pub fn is_map(&self) -> bool {
        matches!(self.kind, FieldKind::Map { .. })
    }

    /// The message this field embeds, if any, ignoring maps.
    pub fn message_type(&self) -> Option<MessageId> {
        match self.kind {
            FieldKind::Named(TypeRef::Message(id)) => Some(id),
            _ => None,
        }
    }
}

fn serialize_wire_type<S: Serializer>(wire_type: &Option<WireType>, serializer: S) -> Result<S::Ok, S::Error> {
    match wire_type {
        Some(wire_type) => serializer.serialize_some(&format!("{:?}", wire_type)),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub name:       String,
    /// Dotted name including the package, without a leading dot.
    pub full_name:  String,
    pub package:    Option<String>,
    pub file:       FileId,
    pub parent:     Option<MessageId>,
    pub location:   Location,
    pub fields:     Vec<Field>,
    pub messages:   Vec<MessageId>,
    pub enums:      Vec<EnumId>,
    pub reserved:   Vec<Reserved>,
    pub extensions: Vec<NumberRange>,
    pub options:    Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name:     String,
    pub location: Location,
    pub number:   i128,
    pub options:  Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enum {
    pub name:      String,
    pub full_name: String,
    pub package:   Option<String>,
    pub file:      FileId,
    pub parent:    Option<MessageId>,
    pub location:  Location,
    pub values:    Vec<EnumValue>,
    pub reserved:  Vec<Reserved>,
    pub options:   Vec<OptionEntry>,
}

/// Every file, message and enum taking part in one compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection {
    pub files:    Vec<File>,
    pub messages: Vec<Message>,
    pub enums:    Vec<Enum>,
}

impl Collection {
    pub fn file(&self, id: FileId) -> &File {
        &self.files[id.0]
    }

    pub fn message(&self, id: MessageId) -> &Message {
        &self.messages[id.0]
    }

    pub fn enumeration(&self, id: EnumId) -> &Enum {
        &self.enums[id.0]
    }

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> {
        (0..self.files.len()).map(FileId)
    }

    pub fn message_ids(&self) -> impl Iterator<Item = MessageId> {
        (0..self.messages.len()).map(MessageId)
    }

    pub fn enum_ids(&self) -> impl Iterator<Item = EnumId> {
        (0..self.enums.len()).map(EnumId)
    }

    /// Flattens one parsed file into the arenas. Imports are recorded
    /// separately once their targets have ids.
    pub fn add_file(&mut self, name: &str, schema: SchemaFile, imported: bool) -> FileId {
        let id = FileId(self.files.len());
        let package = schema.package.clone();
        self.files.push(File {
            name:     name.to_string(),
            path:     schema.path,
            syntax:   schema.syntax,
            package:  package.clone(),
            imports:  Vec::new(),
            imported,
            messages: Vec::new(),
            enums:    Vec::new(),
            options:  schema.options,
        });

        let scope = package.clone().unwrap_or_default();
        for decl in schema.messages {
            let message = self.add_message(decl, id, &package, None, &scope);
            self.files[id.0].messages.push(message);
        }
        for decl in schema.enums {
            let enumeration = self.add_enum(decl, id, &package, None, &scope);
            self.files[id.0].enums.push(enumeration);
        }
        id
    }

    fn add_message(
        &mut self,
        decl: MessageDecl,
        file: FileId,
        package: &Option<String>,
        parent: Option<MessageId>,
        scope: &str,
    ) -> MessageId {
        let id = MessageId(self.messages.len());
        let full_name = qualify(scope, &decl.name);
        self.messages.push(Message {
            name:       decl.name,
            full_name:  full_name.clone(),
            package:    package.clone(),
            file,
            parent,
            location:   decl.location,
            fields:     decl.fields.into_iter().map(field_from_decl).collect(),
            messages:   Vec::new(),
            enums:      Vec::new(),
            reserved:   decl.reserved,
            extensions: decl.extensions,
            options:    decl.options,
        });

        for nested in decl.messages {
            let child = self.add_message(nested, file, package, Some(id), &full_name);
            self.messages[id.0].messages.push(child);
        }
        for nested in decl.enums {
            let child = self.add_enum(nested, file, package, Some(id), &full_name);
            self.messages[id.0].enums.push(child);
        }
        id
    }

    fn add_enum(
        &mut self,
        decl: EnumDecl,
        file: FileId,
        package: &Option<String>,
        parent: Option<MessageId>,
        scope: &str,
    ) -> EnumId {
        let id = EnumId(self.enums.len());
        self.enums.push(Enum {
            full_name: qualify(scope, &decl.name),
            name:      decl.name,
            package:   package.clone(),
            file,
            parent,
            location:  decl.location,
            values:    decl
                .values
                .into_iter()
                .map(|value| EnumValue {
                    name:     value.name,
                    location: value.location,
                    number:   value.number,
                    options:  value.options,
                })
                .collect(),
            reserved:  decl.reserved,
            options:   decl.options,
        });
        id
    }

    /// Files whose public surface `file` re-exports: itself plus everything
    /// reachable through chains of `import public`.
    pub fn exports(&self, file: FileId) -> BTreeSet<FileId> {
        let mut exports = BTreeSet::new();
        let mut stack = vec![file];
        while let Some(next) = stack.pop() {
            if !exports.insert(next) {
                continue;
            }
            for import in &self.file(next).imports {
                if import.kind == ImportKind::Public {
                    stack.push(import.file);
                }
            }
        }
        exports
    }

    /// Files whose types `file` may refer to: its own plus the exports of
    /// each direct import.
    pub fn visible_files(&self, file: FileId) -> BTreeSet<FileId> {
        let mut visible = BTreeSet::new();
        visible.insert(file);
        for import in &self.file(file).imports {
            visible.extend(self.exports(import.file));
        }
        visible
    }

    /// Path of enclosing message names from the outermost down, excluding
    /// the item itself.
    pub fn message_ancestry(&self, parent: Option<MessageId>) -> Vec<MessageId> {
        let mut chain = Vec::new();
        let mut current = parent;
        while let Some(id) = current {
            chain.push(id);
            current = self.message(id).parent;
        }
        chain.reverse();
        chain
    }
}

fn field_from_decl(decl: FieldDecl) -> Field {
    Field {
        name:      decl.name,
        location:  decl.location,
        number:    decl.number,
        label:     decl.label,
        kind:      FieldKind::from_decl(decl.type_),
        oneof:     decl.oneof,
        options:   decl.options,
        wire_type: None,
        packed:    false,
        default:   None,
        boxed:     false,
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_schema};
    use std::path::Path;

    fn collect(files: &[(&str, &str)]) -> Collection {
        let mut collection = Collection::default();
        for (name, text) in files {
            let path = Path::new(name);
            let schema = parse_schema(&tokenize_schema(text, path).unwrap(), path).unwrap();
            collection.add_file(name, schema, false);
        }
        collection
    }

    #[test]
    fn test_flatten_assigns_full_names() {
        let collection = collect(&[(
            "a.proto",
            "package pkg.sub; message Outer { message Inner { enum Mode { A = 0; } } } enum Top { B = 0; }",
        )]);
        let names: Vec<_> = collection.messages.iter().map(|m| m.full_name.as_str()).collect();
        assert_eq!(names, vec!["pkg.sub.Outer", "pkg.sub.Outer.Inner"]);
        let enums: Vec<_> = collection.enums.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(enums, vec!["pkg.sub.Outer.Inner.Mode", "pkg.sub.Top"]);

        let inner = collection.message(MessageId(1));
        assert_eq!(inner.parent, Some(MessageId(0)));
        assert_eq!(inner.enums, vec![EnumId(0)]);
        assert_eq!(collection.message_ancestry(collection.enumeration(EnumId(0)).parent), vec![MessageId(0), MessageId(1)]);
        assert_eq!(collection.file(FileId(0)).messages, vec![MessageId(0)]);
    }

    #[test]
    fn test_visibility_follows_public_imports() {
        let mut collection = collect(&[("a.proto", ""), ("b.proto", ""), ("c.proto", ""), ("d.proto", "")]);
        let import = |file, kind| FileImport { file: FileId(file), kind };
        // a public-imports b, c imports a, d imports c.
        collection.files[0].imports.push(import(1, ImportKind::Public));
        collection.files[2].imports.push(import(0, ImportKind::Default));
        collection.files[3].imports.push(import(2, ImportKind::Default));

        let ids = |ids: &[usize]| ids.iter().copied().map(FileId).collect::<BTreeSet<_>>();
        assert_eq!(collection.visible_files(FileId(2)), ids(&[0, 1, 2]));
        assert_eq!(collection.visible_files(FileId(3)), ids(&[2, 3]));

        collection.files[2].imports[0].kind = ImportKind::Public;
        assert_eq!(collection.visible_files(FileId(3)), ids(&[0, 1, 2, 3]));
    }
}
