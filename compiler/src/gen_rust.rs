use protowire_runtime::{WireType, RUNTIME_SOURCE, RUNTIME_VERSION};
use tracing::debug;

use crate::{
    collection::{Collection, EnumId, EnumValue, Field, FieldKind, FileId, Message, MessageId, TypeRef},
    config::{Config, Indent},
    output::{Artifact, ArtifactKind},
    resolver::{codec_for, wire_type as field_wire_type},
    types::{Constant, Label, ScalarKind},
    wire::{wire_type_path, FieldCodec},
};

/// Name of the emitted runtime artifact.
pub const RUNTIME_FILE: &str = "protowire_runtime.rs";

/// Converts a string to PascalCase.
/// - If the string contains underscores, it splits on underscores and converts each word
///   so that its first letter is uppercase and the rest lowercase.
/// - If the string is fully uppercase, only the first letter stays uppercase.
/// - Otherwise, it ensures only the first letter is uppercase.
pub fn to_pascal_case(s: &str) -> String {
    fn capitalize(word: &str, lower_rest: bool) -> String {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }

    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| capitalize(word, true))
            .collect()
    } else {
        capitalize(s, s == s.to_uppercase())
    }
}

/// Converts a string to snake_case.
/// Underscores are not inserted between consecutive uppercase letters, so acronyms
/// stay intact (e.g. "sessionID" becomes "session_id").
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if (!prev.is_uppercase() && prev != '_')
                    || (prev.is_uppercase() && i + 1 < chars.len() && chars[i + 1].is_lowercase())
                {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
pub fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "abstract", "as", "async", "await", "become", "box", "break", "const",
        "continue", "crate", "do", "dyn", "else", "enum", "extern", "false",
        "final", "fn", "for", "if", "impl", "in", "let", "loop", "macro",
        "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
        "return", "self", "Self", "static", "struct", "super", "trait", "true",
        "try", "type", "typeof", "unsafe", "unsized", "use", "virtual", "where",
        "while", "yield",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

pub(crate) fn type_name(name: &str) -> String {
    escape_rust_keyword(&to_pascal_case(name))
}

pub(crate) fn module_name(name: &str) -> String {
    escape_rust_keyword(&to_snake_case(name))
}

pub(crate) fn field_name(name: &str) -> String {
    escape_rust_keyword(&to_snake_case(name))
}

fn package_scope(package: Option<&str>) -> Vec<String> {
    package
        .map(|package| package.split('.').map(module_name).collect())
        .unwrap_or_default()
}

/// Accumulates generated lines at the current nesting depth.
struct CodeWriter {
    lines:  Vec<String>,
    level:  usize,
    indent: String,
}

impl CodeWriter {
    fn new(indent: Indent) -> Self {
        CodeWriter { lines: Vec::new(), level: 0, indent: indent.unit() }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", self.indent.repeat(self.level), text));
        }
    }

    fn blank(&mut self) {
        self.line("");
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.level += 1;
    }

    fn close(&mut self, text: impl AsRef<str>) {
        self.level = self.level.saturating_sub(1);
        self.line(text);
    }

    /// `} else {` style lines that close one block and open the next.
    fn reopen(&mut self, text: impl AsRef<str>) {
        self.level = self.level.saturating_sub(1);
        self.open(text);
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Emits one module artifact per package (plus the runtime when enabled).
///
/// The result depends only on `collection` and `config`; identical input
/// yields byte-identical artifacts.
pub fn generate(collection: &Collection, config: &Config) -> Vec<Artifact> {
    let mut packages: Vec<(Option<String>, Vec<FileId>)> = Vec::new();
    for id in collection.file_ids() {
        let file = collection.file(id);
        if file.imported && !config.include_imports {
            debug!("not generating {}, it is only imported", file.name);
            continue;
        }
        match packages.iter_mut().find(|(package, _)| *package == file.package) {
            Some((_, files)) => files.push(id),
            None => packages.push((file.package.clone(), vec![id])),
        }
    }

    let generator = Generator {
        collection,
        rt: &config.runtime_path,
        indent: config.indent,
    };

    let mut artifacts = Vec::with_capacity(packages.len() + 1);
    for (package, files) in &packages {
        let path = format!("{}.rs", package.as_deref().unwrap_or("_"));
        debug!("emitting {}", path);
        artifacts.push(Artifact {
            path:     path.into(),
            contents: generator.package(package.as_deref(), files),
            kind:     ArtifactKind::Module,
        });
    }

    if config.emit_runtime {
        artifacts.push(runtime_artifact());
    }
    artifacts
}

/// The runtime source, stamped with its version.
pub fn runtime_artifact() -> Artifact {
    Artifact {
        path:     RUNTIME_FILE.into(),
        contents: format!(
            "// protowire runtime {}. This file is @generated, do not edit.\n\n{}",
            RUNTIME_VERSION, RUNTIME_SOURCE
        ),
        kind:     ArtifactKind::Runtime,
    }
}

struct Generator<'a> {
    collection: &'a Collection,
    rt:         &'a str,
    indent:     Indent,
}

impl<'a> Generator<'a> {
    fn package(&self, package: Option<&str>, files: &[FileId]) -> String {
        let mut w = CodeWriter::new(self.indent);
        w.line(format!(
            "// This file is @generated by protowire-compiler {}. Do not edit.",
            env!("CARGO_PKG_VERSION")
        ));
        let sources: Vec<&str> = files.iter().map(|id| self.collection.file(*id).name.as_str()).collect();
        w.line(format!("// Sources: {}", sources.join(", ")));

        let scope = package_scope(package);
        for id in files {
            let file = self.collection.file(*id);
            for message in &file.messages {
                w.blank();
                self.message(&mut w, *message, &scope);
            }
            for enumeration in &file.enums {
                w.blank();
                self.enumeration(&mut w, *enumeration);
            }
        }
        w.finish()
    }

    fn module_path(&self, package: Option<&str>, parent: Option<MessageId>) -> Vec<String> {
        let mut path = package_scope(package);
        for id in self.collection.message_ancestry(parent) {
            path.push(module_name(&self.collection.message(id).name));
        }
        path
    }

    /// Path to a message or enum as written from inside module `from`.
    fn type_path(&self, from: &[String], type_ref: &TypeRef) -> String {
        let (package, parent, name) = match type_ref {
            TypeRef::Message(id) => {
                let message = self.collection.message(*id);
                (message.package.as_deref(), message.parent, &message.name)
            }
            TypeRef::Enum(id) => {
                let enumeration = self.collection.enumeration(*id);
                (enumeration.package.as_deref(), enumeration.parent, &enumeration.name)
            }
            TypeRef::Unresolved(name) => return type_name(name),
        };
        let target = self.module_path(package, parent);
        let common = from.iter().zip(&target).take_while(|(a, b)| a == b).count();

        let mut segments: Vec<String> = vec!["super".to_string(); from.len() - common];
        segments.extend(target[common..].iter().cloned());
        segments.push(type_name(name));
        segments.join("::")
    }

    fn value_type(&self, kind: &FieldKind, scope: &[String]) -> String {
        match kind {
            FieldKind::Scalar(kind) => FieldCodec::for_scalar(*kind).rust_type.to_string(),
            FieldKind::Named(type_ref) => self.type_path(scope, type_ref),
            FieldKind::Map { key, value } => format!(
                "::std::collections::BTreeMap<{}, {}>",
                self.value_type(key, scope),
                self.value_type(value, scope)
            ),
        }
    }

    fn field_type(&self, field: &Field, scope: &[String]) -> String {
        let element = self.value_type(&field.kind, scope);
        if field.is_map() {
            element
        } else if field.is_repeated() {
            format!("::std::vec::Vec<{}>", element)
        } else if field.message_type().is_some() && field.boxed {
            format!("::core::option::Option<::std::boxed::Box<{}>>", element)
        } else if field.message_type().is_some() || field.label == Label::Optional {
            format!("::core::option::Option<{}>", element)
        } else {
            element
        }
    }

    fn wire_type(&self, wire_type: WireType) -> String {
        wire_type_path(self.rt, wire_type)
    }

    fn message(&self, w: &mut CodeWriter, id: MessageId, scope: &[String]) {
        let message = self.collection.message(id);
        let name = type_name(&message.name);

        w.line("#[derive(Debug, Clone, PartialEq, Default)]");
        w.open(format!("pub struct {} {{", name));
        for field in &message.fields {
            w.line(format!("pub {}: {},", field_name(&field.name), self.field_type(field, scope)));
        }
        w.close("}");

        w.blank();
        self.message_impl(w, message, &name, scope);
        self.accessors(w, message, &name, scope);

        if message.messages.is_empty() && message.enums.is_empty() {
            return;
        }
        let mut nested = scope.to_vec();
        nested.push(module_name(&message.name));

        w.blank();
        w.line(format!("/// Nested types of `{}`.", message.full_name));
        w.open(format!("pub mod {} {{", module_name(&message.name)));
        let mut first = true;
        for child in &message.messages {
            if !std::mem::take(&mut first) {
                w.blank();
            }
            self.message(w, *child, &nested);
        }
        for child in &message.enums {
            if !std::mem::take(&mut first) {
                w.blank();
            }
            self.enumeration(w, *child);
        }
        w.close("}");
    }

    fn message_impl(&self, w: &mut CodeWriter, message: &Message, name: &str, scope: &[String]) {
        let rt = self.rt;
        w.open(format!("impl {}::Message for {} {{", rt, name));

        let writer = if message.fields.is_empty() { "_bb" } else { "bb" };
        w.open(format!("fn write_to(&self, {}: &mut {}::ByteBufferMut) {{", writer, rt));
        for field in &message.fields {
            self.write_field(w, field, scope);
        }
        w.close("}");

        w.blank();
        w.open(format!(
            "fn merge_from(&mut self, bb: &mut {}::ByteBuffer<'_>) -> ::core::result::Result<(), {}::DecodeError> {{",
            rt, rt
        ));
        let required: Vec<&Field> = message.fields.iter().filter(|f| f.label == Label::Required).collect();
        for field in &required {
            w.line(format!("let mut has_{} = false;", to_snake_case(&field.name)));
        }
        w.open("while !bb.is_empty() {");
        if message.fields.is_empty() {
            w.line("let (_, wire_type) = bb.read_tag()?;");
            w.line("bb.skip_field(wire_type)?;");
        } else {
            w.line("let (field, wire_type) = bb.read_tag()?;");
            w.open("match field {");
            for field in &message.fields {
                self.read_arm(w, field, scope);
            }
            w.line("_ => bb.skip_field(wire_type)?,");
            w.close("}");
        }
        w.close("}");
        for field in &required {
            w.open(format!("if !has_{} {{", to_snake_case(&field.name)));
            w.line(format!(
                "return ::core::result::Result::Err({}::DecodeError::MissingField {{ message: {:?}, field: {:?} }});",
                rt, message.full_name, field.name
            ));
            w.close("}");
        }
        w.line("::core::result::Result::Ok(())");
        w.close("}");

        w.close("}");
    }

    fn write_field(&self, w: &mut CodeWriter, field: &Field, scope: &[String]) {
        let place = format!("self.{}", field_name(&field.name));
        let number = field.number;
        let element = field_wire_type(field);

        if let FieldKind::Map { key, value } = &field.kind {
            w.open(format!("for (key, value) in &{} {{", place));
            w.line(format!("let mut entry = {}::ByteBufferMut::new();", self.rt));
            self.write_tagged(w, "entry", 1, codec_for(key).wire_type, key, "key", true, false);
            self.write_tagged(w, "entry", 2, codec_for(value).wire_type, value, "value", true, false);
            w.line(format!("bb.write_tag({}, {});", number, self.wire_type(WireType::LengthDelimited)));
            w.line("bb.write_length_delimited(entry.as_slice());");
            w.close("}");
        } else if field.is_repeated() && field.packed {
            w.open(format!("if !{}.is_empty() {{", place));
            w.line(format!("let mut packed = {}::ByteBufferMut::new();", self.rt));
            w.open(format!("for value in &{} {{", place));
            self.write_value(w, "packed", &field.kind, "value", true, false);
            w.close("}");
            w.line(format!("bb.write_tag({}, {});", number, self.wire_type(WireType::LengthDelimited)));
            w.line("bb.write_length_delimited(packed.as_slice());");
            w.close("}");
        } else if field.is_repeated() {
            w.open(format!("for value in &{} {{", place));
            self.write_tagged(w, "bb", number, element, &field.kind, "value", true, false);
            w.close("}");
        } else if field.message_type().is_some() || field.label == Label::Optional {
            w.open(format!("if let ::core::option::Option::Some(value) = &{} {{", place));
            self.write_tagged(w, "bb", number, element, &field.kind, "value", true, field.boxed);
            w.close("}");
        } else if field.label == Label::Required {
            self.write_tagged(w, "bb", number, element, &field.kind, &place, false, false);
        } else {
            w.open(format!("if {} {{", self.non_default(field, &place, scope)));
            self.write_tagged(w, "bb", number, element, &field.kind, &place, false, false);
            w.close("}");
        }
    }

    /// Condition under which an implicit-presence field is written.
    fn non_default(&self, field: &Field, place: &str, scope: &[String]) -> String {
        match &field.kind {
            FieldKind::Scalar(ScalarKind::Bool) => place.to_string(),
            FieldKind::Scalar(ScalarKind::String | ScalarKind::Bytes) => format!("!{}.is_empty()", place),
            FieldKind::Scalar(ScalarKind::Float | ScalarKind::Double) => format!("{} != 0.0", place),
            FieldKind::Scalar(_) => format!("{} != 0", place),
            FieldKind::Named(type_ref) => format!("{} != {}::default()", place, self.type_path(scope, type_ref)),
            FieldKind::Map { .. } => format!("!{}.is_empty()", place),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write_tagged(
        &self,
        w: &mut CodeWriter,
        buffer: &str,
        number: i128,
        wire_type: WireType,
        kind: &FieldKind,
        value: &str,
        by_ref: bool,
        boxed: bool,
    ) {
        w.line(format!("{}.write_tag({}, {});", buffer, number, self.wire_type(wire_type)));
        self.write_value(w, buffer, kind, value, by_ref, boxed);
    }

    fn write_value(&self, w: &mut CodeWriter, buffer: &str, kind: &FieldKind, value: &str, by_ref: bool, boxed: bool) {
        match kind {
            FieldKind::Scalar(scalar) => w.line(FieldCodec::for_scalar(*scalar).write_stmt(buffer, value, by_ref)),
            FieldKind::Named(TypeRef::Enum(_)) => {
                let deref = if by_ref { "*" } else { "" };
                w.line(format!("{}.write_int32({}{} as i32);", buffer, deref, value));
            }
            _ => {
                let target = if boxed { format!("&**{}", value) } else { value.to_string() };
                w.line(format!("let mut inner = {}::ByteBufferMut::new();", self.rt));
                w.line(format!("{}::Message::write_to({}, &mut inner);", self.rt, target));
                w.line(format!("{}.write_length_delimited(inner.as_slice());", buffer));
            }
        }
    }

    fn expect_wire_type(&self, w: &mut CodeWriter, wire_type: WireType) {
        w.line(format!(
            "{}::expect_wire_type(field, wire_type, {})?;",
            self.rt,
            self.wire_type(wire_type)
        ));
    }

    fn read_arm(&self, w: &mut CodeWriter, field: &Field, scope: &[String]) {
        let rt = self.rt;
        let place = format!("self.{}", field_name(&field.name));
        let codec = codec_for(&field.kind);
        let element = field_wire_type(field);
        w.open(format!("{} => {{", field.number));

        if let FieldKind::Map { key, value } = &field.kind {
            self.expect_wire_type(w, element);
            w.line(format!("let mut entry = {}::ByteBuffer::new(bb.read_length_delimited()?);", rt));
            w.line(format!("let mut key: {} = ::core::default::Default::default();", self.value_type(key, scope)));
            w.line(format!("let mut value: {} = ::core::default::Default::default();", self.value_type(value, scope)));
            w.open("while !entry.is_empty() {");
            w.line("let (field, wire_type) = entry.read_tag()?;");
            w.open("match field {");
            w.open("1 => {");
            self.expect_wire_type(w, codec_for(key).wire_type);
            self.read_value(w, "entry", key, scope, &|v| format!("key = {};", v));
            w.close("}");
            w.open("2 => {");
            self.expect_wire_type(w, codec_for(value).wire_type);
            if let FieldKind::Named(TypeRef::Message(_)) = value.as_ref() {
                w.line(format!("let mut inner = {}::ByteBuffer::new(entry.read_length_delimited()?);", rt));
                w.line(format!("{}::Message::merge_from(&mut value, &mut inner)?;", rt));
            } else {
                self.read_value(w, "entry", value, scope, &|v| format!("value = {};", v));
            }
            w.close("}");
            w.line("_ => entry.skip_field(wire_type)?,");
            w.close("}");
            w.close("}");
            w.line(format!("{}.insert(key, value);", place));
        } else if field.message_type().is_some() && !field.is_repeated() {
            self.expect_wire_type(w, element);
            w.line(format!("let mut inner = {}::ByteBuffer::new(bb.read_length_delimited()?);", rt));
            w.line(format!("let target = {}.get_or_insert_with(::core::default::Default::default);", place));
            let target = if field.boxed { "&mut **target" } else { "target" };
            w.line(format!("{}::Message::merge_from({}, &mut inner)?;", rt, target));
        } else if field.is_repeated() && codec.packable {
            let push = |v: &str| format!("{}.push({});", place, v);
            w.open(format!("if wire_type == {} {{", self.wire_type(WireType::LengthDelimited)));
            w.line(format!("let mut packed = {}::ByteBuffer::new(bb.read_length_delimited()?);", rt));
            w.open("while !packed.is_empty() {");
            self.read_value(w, "packed", &field.kind, scope, &push);
            w.close("}");
            w.reopen("} else {");
            self.expect_wire_type(w, element);
            self.read_value(w, "bb", &field.kind, scope, &push);
            w.close("}");
        } else {
            self.expect_wire_type(w, element);
            let assign = |v: &str| match field.label {
                Label::Repeated => format!("{}.push({});", place, v),
                Label::Optional => format!("{} = ::core::option::Option::Some({});", place, v),
                Label::Implicit | Label::Required => format!("{} = {};", place, v),
            };
            self.read_value(w, "bb", &field.kind, scope, &assign);
        }

        if field.label == Label::Required {
            w.line(format!("has_{} = true;", to_snake_case(&field.name)));
        }
        w.close("}");
    }

    /// Reads one element from `buffer` and hands the expression holding it
    /// to `assign`. Unknown enum numbers are dropped.
    fn read_value(
        &self,
        w: &mut CodeWriter,
        buffer: &str,
        kind: &FieldKind,
        scope: &[String],
        assign: &dyn Fn(&str) -> String,
    ) {
        match kind {
            FieldKind::Scalar(scalar) => w.line(assign(&FieldCodec::for_scalar(*scalar).read_expr(buffer))),
            FieldKind::Named(type_ref @ TypeRef::Enum(_)) => {
                w.open(format!(
                    "if let ::core::option::Option::Some(decoded) = {}::from_i32({}.read_int32()?) {{",
                    self.type_path(scope, type_ref),
                    buffer
                ));
                w.line(assign("decoded"));
                w.close("}");
            }
            _ => {
                w.line(format!("let mut inner = {}::ByteBuffer::new({}.read_length_delimited()?);", self.rt, buffer));
                w.line(format!(
                    "let mut element: {} = ::core::default::Default::default();",
                    self.value_type(kind, scope)
                ));
                w.line(format!("{}::Message::merge_from(&mut element, &mut inner)?;", self.rt));
                w.line(assign("element"));
            }
        }
    }

    /// `<field>_or_default` accessors for optional fields with declared defaults.
    fn accessors(&self, w: &mut CodeWriter, message: &Message, name: &str, scope: &[String]) {
        let fields: Vec<&Field> = message.fields.iter().filter(|f| f.default.is_some()).collect();
        if fields.is_empty() {
            return;
        }

        w.blank();
        w.open(format!("impl {} {{", name));
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                w.blank();
            }
            let Some(default) = &field.default else { continue };
            let place = format!("self.{}", field_name(&field.name));
            let method = format!("{}_or_default", to_snake_case(&field.name));
            let (return_type, body) = match (&field.kind, default) {
                (FieldKind::Scalar(ScalarKind::String), Constant::Str(text)) => {
                    ("&str".to_string(), format!("{}.as_deref().unwrap_or({:?})", place, text))
                }
                (FieldKind::Scalar(ScalarKind::Bytes), Constant::Str(text)) => {
                    ("&[u8]".to_string(), format!("{}.as_deref().unwrap_or({})", place, byte_string(text.as_bytes())))
                }
                (FieldKind::Scalar(ScalarKind::Bytes), Constant::Bytes(bytes)) => {
                    ("&[u8]".to_string(), format!("{}.as_deref().unwrap_or({})", place, byte_string(bytes)))
                }
                (FieldKind::Scalar(scalar), constant) => (
                    FieldCodec::for_scalar(*scalar).rust_type.to_string(),
                    format!("{}.unwrap_or({})", place, scalar_literal(*scalar, constant)),
                ),
                (FieldKind::Named(type_ref), Constant::Ident(value)) => {
                    let path = self.type_path(scope, type_ref);
                    let body = format!("{}.unwrap_or({}::{})", place, path, type_name(value));
                    (path, body)
                }
                _ => continue,
            };
            w.line(format!("/// Returns `{}`, or its declared default when unset.", field.name));
            w.open(format!("pub fn {}(&self) -> {} {{", method, return_type));
            w.line(body);
            w.close("}");
        }
        w.close("}");
    }

    fn enumeration(&self, w: &mut CodeWriter, id: EnumId) {
        let enumeration = self.collection.enumeration(id);
        let name = type_name(&enumeration.name);

        let mut canonical: Vec<&EnumValue> = Vec::new();
        let mut aliases: Vec<(&EnumValue, &EnumValue)> = Vec::new();
        for value in &enumeration.values {
            match canonical.iter().copied().find(|c| c.number == value.number) {
                Some(original) => aliases.push((value, original)),
                None => canonical.push(value),
            }
        }

        w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]");
        w.line("#[repr(i32)]");
        w.open(format!("pub enum {} {{", name));
        for (i, value) in canonical.iter().enumerate() {
            if i == 0 {
                w.line("#[default]");
            }
            w.line(format!("{} = {},", type_name(&value.name), value.number));
        }
        w.close("}");

        w.blank();
        w.open(format!("impl {} {{", name));
        for (alias, original) in &aliases {
            w.line("#[allow(non_upper_case_globals)]");
            w.line(format!(
                "pub const {}: {} = {}::{};",
                type_name(&alias.name),
                name,
                name,
                type_name(&original.name)
            ));
            w.blank();
        }

        w.open(format!("pub fn from_i32(value: i32) -> ::core::option::Option<{}> {{", name));
        w.open("match value {");
        for value in &canonical {
            w.line(format!(
                "{} => ::core::option::Option::Some({}::{}),",
                value.number,
                name,
                type_name(&value.name)
            ));
        }
        w.line("_ => ::core::option::Option::None,");
        w.close("}");
        w.close("}");

        w.blank();
        w.line("/// The value's name as declared in the schema.");
        w.open("pub fn as_str_name(&self) -> &'static str {");
        w.open("match self {");
        for value in &canonical {
            w.line(format!("{}::{} => {:?},", name, type_name(&value.name), value.name));
        }
        w.close("}");
        w.close("}");
        w.close("}");
    }
}

fn scalar_literal(kind: ScalarKind, constant: &Constant) -> String {
    let rust_type = FieldCodec::for_scalar(kind).rust_type;
    match constant {
        Constant::Integer(value) => format!("{}_{}", value, rust_type),
        Constant::Float(value) if value.is_nan() => format!("{}::NAN", rust_type),
        Constant::Float(value) if value.is_infinite() && *value > 0.0 => format!("{}::INFINITY", rust_type),
        Constant::Float(value) if value.is_infinite() => format!("{}::NEG_INFINITY", rust_type),
        Constant::Float(value) => format!("{:?}_{}", value, rust_type),
        other => other.to_string(),
    }
}

fn byte_string(bytes: &[u8]) -> String {
    let mut literal = String::from("b\"");
    for &byte in bytes {
        match byte {
            b'"' | b'\\' => {
                literal.push('\\');
                literal.push(byte as char);
            }
            0x20..=0x7E => literal.push(byte as char),
            _ => literal.push_str(&format!("\\x{:02x}", byte)),
        }
    }
    literal.push('"');
    literal
}
