use std::collections::{BTreeMap, BTreeSet, HashMap};

use protowire_runtime::{WireType, MAX_FIELD_NUMBER};
use tracing::debug;

use crate::{
    collection::{Collection, Enum, EnumId, Field, FieldKind, FileId, Message, MessageId, TypeRef},
    config::Config,
    error::{Error, Location},
    gen_rust::{field_name, module_name, type_name},
    types::{find_option, Constant, Label, Reserved, ScalarKind, Syntax},
    utils::quote,
    wire::FieldCodec,
};

const IMPLEMENTATION_RESERVED: std::ops::RangeInclusive<i128> = 19_000..=19_999;

struct Definition {
    type_ref: TypeRef,
    file:     FileId,
    location: Location,
}

enum Lookup {
    Found(TypeRef),
    /// Exists, but in a file the referrer cannot see.
    Hidden { full_name: String, file: FileId },
    Missing,
}

/// Binds every type reference in `collection`, assigns wire types and
/// validates names, numbers, options and enums.
///
/// This is the last pass allowed to mutate the collection.
pub fn resolve_types(collection: &mut Collection, config: &Config) -> Result<(), Error> {
    let index = build_index(collection)?;

    for id in collection.enum_ids() {
        check_enum(collection, collection.enumeration(id), config)?;
    }

    for id in collection.message_ids() {
        let message = collection.message(id);
        check_field_names(message)?;
        check_field_numbers(message)?;

        let syntax = collection.file(message.file).syntax;
        let visible = collection.visible_files(message.file);
        debug!("{} sees {} file(s)", message.full_name, visible.len());

        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            fields.push(resolve_field(collection, &index, message, field, syntax, &visible, config)?);
        }
        collection.messages[id.0].fields = fields;
    }

    check_rust_identifiers(collection)?;
    check_required_recursion(collection)?;
    assign_boxing(collection);
    Ok(())
}

fn build_index(collection: &Collection) -> Result<BTreeMap<String, Definition>, Error> {
    let mut index: BTreeMap<String, Definition> = BTreeMap::new();
    let messages = collection.messages.iter().enumerate().map(|(id, message)| {
        (&message.full_name, TypeRef::Message(MessageId(id)), message.file, &message.location)
    });
    let enums = collection.enums.iter().enumerate().map(|(id, enumeration)| {
        (&enumeration.full_name, TypeRef::Enum(EnumId(id)), enumeration.file, &enumeration.location)
    });

    for (full_name, type_ref, file, location) in messages.chain(enums) {
        if let Some(first) = index.get(full_name) {
            return Err(Error::DuplicateName {
                location: location.clone(),
                name:     full_name.clone(),
                first:    first.location.clone(),
                clash:    None,
            });
        }
        index.insert(
            full_name.clone(),
            Definition { type_ref, file, location: location.clone() },
        );
    }
    Ok(index)
}

/// Candidate full names for `name` referenced from inside `scope`,
/// innermost scope first.
fn candidates(name: &str, scope: &str) -> Vec<String> {
    if let Some(absolute) = name.strip_prefix('.') {
        return vec![absolute.to_string()];
    }
    let parts: Vec<&str> = if scope.is_empty() { Vec::new() } else { scope.split('.').collect() };
    (0..=parts.len())
        .rev()
        .map(|len| {
            if len == 0 {
                name.to_string()
            } else {
                format!("{}.{}", parts[..len].join("."), name)
            }
        })
        .collect()
}

fn lookup(
    index: &BTreeMap<String, Definition>,
    name: &str,
    scope: &str,
    visible: &BTreeSet<FileId>,
) -> Lookup {
    let mut hidden = None;
    for candidate in candidates(name, scope) {
        if let Some(definition) = index.get(&candidate) {
            if visible.contains(&definition.file) {
                return Lookup::Found(definition.type_ref.clone());
            }
            hidden.get_or_insert((candidate, definition.file));
        }
    }
    match hidden {
        Some((full_name, file)) => Lookup::Hidden { full_name, file },
        None => Lookup::Missing,
    }
}

fn resolve_field(
    collection: &Collection,
    index: &BTreeMap<String, Definition>,
    message: &Message,
    field: &Field,
    syntax: Syntax,
    visible: &BTreeSet<FileId>,
    config: &Config,
) -> Result<Field, Error> {
    let mut resolved = field.clone();

    if syntax == Syntax::Proto3 && field.label == Label::Required {
        return Err(Error::invalid(&field.location, "required fields are not allowed in proto3"));
    }

    let resolve = |kind: &FieldKind| -> Result<FieldKind, Error> {
        match kind {
            FieldKind::Named(TypeRef::Unresolved(name)) => {
                match lookup(index, name, &message.full_name, visible) {
                    Lookup::Found(type_ref) => Ok(FieldKind::Named(type_ref)),
                    Lookup::Hidden { full_name, file } => Err(type_error(
                        message,
                        field,
                        name,
                        Some(format!(
                            "{} is defined in {}, which is not imported here",
                            quote(&full_name),
                            quote(&collection.file(file).name)
                        )),
                    )),
                    Lookup::Missing => Err(type_error(message, field, name, None)),
                }
            }
            other => Ok(other.clone()),
        }
    };

    resolved.kind = match &field.kind {
        FieldKind::Map { key, value } => {
            match key.as_ref() {
                FieldKind::Scalar(kind) if kind.is_valid_map_key() => {}
                _ => {
                    return Err(Error::invalid(
                        &field.location,
                        format!(
                            "map field {} must have an integral, bool or string key",
                            quote(&field.name)
                        ),
                    ))
                }
            }
            FieldKind::Map { key: key.clone(), value: Box::new(resolve(value)?) }
        }
        kind => resolve(kind)?,
    };

    if config.reduced_numerics {
        if let Some(kind) = wide_scalar(&resolved.kind) {
            return Err(type_error(
                message,
                field,
                kind.name(),
                Some("64-bit numeric types are disabled by reduced numerics".to_string()),
            ));
        }
    }

    let codec = codec_for(&resolved.kind);
    resolved.wire_type = Some(codec.wire_type);
    resolved.packed = resolve_packed(field, codec.packable, syntax)?;
    resolved.default = resolve_default(collection, field, &resolved.kind, syntax)?;
    Ok(resolved)
}

fn type_error(message: &Message, field: &Field, name: &str, hint: Option<String>) -> Error {
    Error::TypeResolution {
        location: field.location.clone(),
        field:    field.name.clone(),
        message:  message.full_name.clone(),
        name:     name.to_string(),
        hint,
    }
}

/// The codec deciding the wire type of a resolved field kind. Maps are
/// framed as embedded entry messages.
pub fn codec_for(kind: &FieldKind) -> FieldCodec {
    match kind {
        FieldKind::Scalar(kind) => FieldCodec::for_scalar(*kind),
        FieldKind::Named(TypeRef::Enum(_)) => FieldCodec::for_enum(),
        FieldKind::Named(_) | FieldKind::Map { .. } => FieldCodec::for_message(),
    }
}

fn wide_scalar(kind: &FieldKind) -> Option<ScalarKind> {
    match kind {
        FieldKind::Scalar(kind) if kind.is_64_bit() => Some(*kind),
        FieldKind::Map { key, value } => wide_scalar(key).or_else(|| wide_scalar(value)),
        _ => None,
    }
}

fn bool_option(field: &Field, name: &str) -> Result<Option<bool>, Error> {
    match find_option(&field.options, name) {
        None => Ok(None),
        Some(option) => match &option.value {
            Constant::Ident(value) if value == "true" => Ok(Some(true)),
            Constant::Ident(value) if value == "false" => Ok(Some(false)),
            other => Err(Error::invalid(
                &option.location,
                format!("option {} expects true or false, found {}", name, other),
            )),
        },
    }
}

fn resolve_packed(field: &Field, packable: bool, syntax: Syntax) -> Result<bool, Error> {
    let packable = packable && field.is_repeated() && !field.is_map();
    match bool_option(field, "packed")? {
        Some(true) if !packable => Err(Error::invalid(
            &field.location,
            format!(
                "[packed = true] is only allowed on repeated scalar or enum fields, not {}",
                quote(&field.name)
            ),
        )),
        Some(packed) => Ok(packed),
        None => Ok(packable && syntax == Syntax::Proto3),
    }
}

fn resolve_default(
    collection: &Collection,
    field: &Field,
    kind: &FieldKind,
    syntax: Syntax,
) -> Result<Option<Constant>, Error> {
    let Some(option) = find_option(&field.options, "default") else {
        return Ok(None);
    };
    let fail = |message: String| Err(Error::invalid(&option.location, message));

    if syntax == Syntax::Proto3 {
        return fail("default values are not allowed in proto3".to_string());
    }
    if field.label != Label::Optional {
        return fail(format!(
            "default values are only supported on optional fields, {} is not optional",
            quote(&field.name)
        ));
    }

    let value = &option.value;
    let mismatch = |expected: &str| -> Result<Option<Constant>, Error> {
        fail(format!("default value {} is not a valid {}", value, expected))
    };

    let normalized = match kind {
        FieldKind::Scalar(scalar) => match (scalar, value) {
            (ScalarKind::Float | ScalarKind::Double, Constant::Integer(number)) => {
                Constant::Float(*number as f64)
            }
            (ScalarKind::Float | ScalarKind::Double, Constant::Float(number)) => Constant::Float(*number),
            (ScalarKind::Float | ScalarKind::Double, Constant::Ident(name)) if name == "inf" => {
                Constant::Float(f64::INFINITY)
            }
            (ScalarKind::Float | ScalarKind::Double, Constant::Ident(name)) if name == "nan" => {
                Constant::Float(f64::NAN)
            }
            (ScalarKind::Bool, Constant::Ident(name)) if name == "true" || name == "false" => value.clone(),
            (ScalarKind::String | ScalarKind::Bytes, Constant::Str(_)) => value.clone(),
            (ScalarKind::Bytes, Constant::Bytes(_)) => value.clone(),
            (ScalarKind::String, Constant::Bytes(_)) => {
                return fail(format!("default value {} is not valid UTF-8", value));
            }
            (_, Constant::Integer(number)) => match integer_range(*scalar) {
                Some((min, max)) if *number < min || *number > max => {
                    return fail(format!(
                        "default value {} is out of range for {}",
                        number,
                        scalar.name()
                    ));
                }
                Some(_) => value.clone(),
                None => return mismatch(scalar.name()),
            },
            _ => return mismatch(scalar.name()),
        },
        FieldKind::Named(TypeRef::Enum(id)) => {
            let enumeration = collection.enumeration(*id);
            match value {
                Constant::Ident(name) if enumeration.values.iter().any(|v| &v.name == name) => value.clone(),
                _ => return mismatch(&format!("value of enum {}", quote(&enumeration.full_name))),
            }
        }
        _ => {
            return fail(format!(
                "default values are only supported on scalar and enum fields, {} is neither",
                quote(&field.name)
            ))
        }
    };
    Ok(Some(normalized))
}

fn integer_range(kind: ScalarKind) -> Option<(i128, i128)> {
    match kind {
        ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => {
            Some((i128::from(i32::MIN), i128::from(i32::MAX)))
        }
        ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => {
            Some((i128::from(i64::MIN), i128::from(i64::MAX)))
        }
        ScalarKind::Uint32 | ScalarKind::Fixed32 => Some((0, i128::from(u32::MAX))),
        ScalarKind::Uint64 | ScalarKind::Fixed64 => Some((0, i128::from(u64::MAX))),
        _ => None,
    }
}

fn check_field_names(message: &Message) -> Result<(), Error> {
    let mut seen: HashMap<&str, &Location> = HashMap::new();
    for field in &message.fields {
        if let Some(first) = seen.insert(&field.name, &field.location) {
            return Err(Error::DuplicateName {
                location: field.location.clone(),
                name:     format!("{}.{}", message.full_name, field.name),
                first:    first.clone(),
                clash:    None,
            });
        }
        if is_reserved_name(&message.reserved, &field.name) {
            return Err(Error::invalid(
                &field.location,
                format!("field name {} is reserved in {}", quote(&field.name), quote(&message.full_name)),
            ));
        }
    }
    Ok(())
}

type Claims<'a> = HashMap<String, (&'a str, &'a Location)>;

/// Records that `name` becomes the Rust identifier `rust` inside `scope`.
fn claim<'a>(
    claims: &mut Claims<'a>,
    rust: String,
    name: &'a str,
    location: &'a Location,
    scope: &str,
) -> Result<(), Error> {
    match claims.get(&rust) {
        // A message claims both its type and its module.
        Some((first, _)) if *first == name => Ok(()),
        Some((first, first_location)) => Err(Error::DuplicateName {
            location: location.clone(),
            name:     if scope.is_empty() { name.to_string() } else { format!("{}.{}", scope, name) },
            first:    (*first_location).clone(),
            clash:    Some(format!(
                "{} and {} both become the Rust identifier {}",
                quote(first),
                quote(name),
                quote(&rust)
            )),
        }),
        None => {
            claims.insert(rust, (name, location));
            Ok(())
        }
    }
}

/// Distinct schema names have to stay distinct after case conversion and
/// keyword escaping. Types and modules share one namespace per package or
/// enclosing message.
fn check_rust_identifiers(collection: &Collection) -> Result<(), Error> {
    for message in &collection.messages {
        let mut claims = Claims::new();
        for field in &message.fields {
            claim(&mut claims, field_name(&field.name), &field.name, &field.location, &message.full_name)?;
        }
    }
    for enumeration in &collection.enums {
        let mut claims = Claims::new();
        for value in &enumeration.values {
            claim(&mut claims, type_name(&value.name), &value.name, &value.location, &enumeration.full_name)?;
        }
    }

    let scope_name = |package: &Option<String>, parent: Option<MessageId>| match parent {
        Some(parent) => collection.message(parent).full_name.clone(),
        None => package.clone().unwrap_or_default(),
    };
    let mut scopes: HashMap<(Option<&str>, Option<MessageId>), Claims> = HashMap::new();
    for message in &collection.messages {
        let scope = scope_name(&message.package, message.parent);
        let claims = scopes.entry((message.package.as_deref(), message.parent)).or_default();
        claim(claims, type_name(&message.name), &message.name, &message.location, &scope)?;
        if !message.messages.is_empty() || !message.enums.is_empty() {
            claim(claims, module_name(&message.name), &message.name, &message.location, &scope)?;
        }
    }
    for enumeration in &collection.enums {
        let scope = scope_name(&enumeration.package, enumeration.parent);
        let claims = scopes.entry((enumeration.package.as_deref(), enumeration.parent)).or_default();
        claim(claims, type_name(&enumeration.name), &enumeration.name, &enumeration.location, &scope)?;
    }
    Ok(())
}

fn check_field_numbers(message: &Message) -> Result<(), Error> {
    let number_error = |field: &Field, reason: String| Error::FieldNumber {
        location: field.location.clone(),
        field:    field.name.clone(),
        message:  message.full_name.clone(),
        number:   field.number,
        reason,
    };

    let mut used: HashMap<i128, &str> = HashMap::new();
    for field in &message.fields {
        let number = field.number;
        if number < 1 || number > i128::from(MAX_FIELD_NUMBER) {
            return Err(number_error(
                field,
                format!("field number {} must be between 1 and {}", number, MAX_FIELD_NUMBER),
            ));
        }
        if IMPLEMENTATION_RESERVED.contains(&number) {
            return Err(number_error(
                field,
                format!("field number {} is in the range 19000 to 19999 reserved by protocol buffers", number),
            ));
        }
        if is_reserved_number(&message.reserved, number) {
            return Err(number_error(field, format!("field number {} is reserved", number)));
        }
        if message.extensions.iter().any(|range| range.contains(number)) {
            return Err(number_error(field, format!("field number {} is in an extension range", number)));
        }
        if let Some(previous) = used.insert(number, &field.name) {
            return Err(number_error(
                field,
                format!("field number {} is already used by field {}", number, quote(previous)),
            ));
        }
    }
    Ok(())
}

fn is_reserved_number(reserved: &[Reserved], number: i128) -> bool {
    reserved.iter().any(|entry| matches!(entry, Reserved::Range(range) if range.contains(number)))
}

fn is_reserved_name(reserved: &[Reserved], name: &str) -> bool {
    reserved.iter().any(|entry| matches!(entry, Reserved::Name(reserved) if reserved == name))
}

fn check_enum(collection: &Collection, enumeration: &Enum, config: &Config) -> Result<(), Error> {
    let Some(first) = enumeration.values.first() else {
        return Err(Error::invalid(
            &enumeration.location,
            format!("enum {} must contain at least one value", quote(&enumeration.full_name)),
        ));
    };

    let proto3 = collection.file(enumeration.file).syntax == Syntax::Proto3;
    if (proto3 || config.strict_enums) && first.number != 0 {
        return Err(Error::invalid(
            &first.location,
            format!("the first value of enum {} must be zero", quote(&enumeration.full_name)),
        ));
    }

    let allow_alias = match find_option(&enumeration.options, "allow_alias") {
        Some(option) => matches!(&option.value, Constant::Ident(value) if value == "true"),
        None => false,
    };

    let mut names: HashMap<&str, &Location> = HashMap::new();
    let mut numbers: HashMap<i128, &str> = HashMap::new();
    for value in &enumeration.values {
        if value.number < i128::from(i32::MIN) || value.number > i128::from(i32::MAX) {
            return Err(Error::invalid(
                &value.location,
                format!("enum value {} = {} does not fit in int32", quote(&value.name), value.number),
            ));
        }
        if let Some(first) = names.insert(&value.name, &value.location) {
            return Err(Error::DuplicateName {
                location: value.location.clone(),
                name:     format!("{}.{}", enumeration.full_name, value.name),
                first:    first.clone(),
                clash:    None,
            });
        }
        if is_reserved_number(&enumeration.reserved, value.number)
            || is_reserved_name(&enumeration.reserved, &value.name)
        {
            return Err(Error::invalid(
                &value.location,
                format!("enum value {} uses a reserved name or number", quote(&value.name)),
            ));
        }
        if let Some(original) = numbers.insert(value.number, &value.name) {
            if config.strict_enums && !allow_alias {
                return Err(Error::invalid(
                    &value.location,
                    format!(
                        "enum value {} reuses number {} of {}; set option allow_alias = true to permit aliases",
                        quote(&value.name),
                        value.number,
                        quote(original)
                    ),
                ));
            }
            // Keep the first declaration as the canonical owner.
            numbers.insert(value.number, original);
        }
    }
    Ok(())
}

fn required_message(field: &Field) -> Option<MessageId> {
    if field.label == Label::Required {
        field.message_type()
    } else {
        None
    }
}

/// Messages linked in a cycle of `required` message fields can never be
/// fully populated, so they are rejected.
fn check_required_recursion(collection: &Collection) -> Result<(), Error> {
    fn visit(
        collection: &Collection,
        id: MessageId,
        state: &mut HashMap<MessageId, u8>,
    ) -> Result<(), Error> {
        if state.contains_key(&id) {
            return Ok(());
        }
        state.insert(id, 1);
        let message = collection.message(id);
        for field in &message.fields {
            let Some(target) = required_message(field) else { continue };
            if state.get(&target) == Some(&1) {
                return Err(type_error(
                    message,
                    field,
                    &collection.message(target).full_name,
                    Some("required message fields form a cycle, so the message can never be constructed".to_string()),
                ));
            }
            visit(collection, target, state)?;
        }
        state.insert(id, 2);
        Ok(())
    }

    let mut state = HashMap::new();
    for id in collection.message_ids() {
        if !state.contains_key(&id) {
            visit(collection, id, &mut state)?;
        }
    }
    Ok(())
}

/// Singular message fields whose type leads back to the containing
/// message through other singular message fields need a `Box`.
fn assign_boxing(collection: &mut Collection) {
    let singular = |field: &Field| {
        if field.is_repeated() {
            None
        } else {
            field.message_type()
        }
    };

    let edges: Vec<Vec<MessageId>> = collection
        .messages
        .iter()
        .map(|message| message.fields.iter().filter_map(singular).collect())
        .collect();

    let reaches = |from: MessageId, to: MessageId| {
        let mut seen = BTreeSet::new();
        let mut stack = vec![from];
        while let Some(next) = stack.pop() {
            if next == to {
                return true;
            }
            if seen.insert(next) {
                stack.extend(edges[next.0].iter().copied());
            }
        }
        false
    };

    for id in collection.message_ids().collect::<Vec<_>>() {
        let boxed: Vec<bool> = collection.messages[id.0]
            .fields
            .iter()
            .map(|field| singular(field).is_some_and(|target| reaches(target, id)))
            .collect();
        for (field, boxed) in collection.messages[id.0].fields.iter_mut().zip(boxed) {
            field.boxed = boxed;
            if boxed {
                debug!("boxing {} to break a type cycle", field.name);
            }
        }
    }
}

/// The element wire type of a resolved field.
pub fn wire_type(field: &Field) -> WireType {
    field.wire_type.unwrap_or_else(|| codec_for(&field.kind).wire_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{resolve_imports, MemorySource};

    fn resolve_with(files: &[(&str, &str)], config: &Config) -> Result<Collection, Error> {
        let mut source = MemorySource::new();
        for (name, text) in files {
            source.add(*name, *text);
        }
        let mut collection = resolve_imports(&source, [files[0].0])?;
        resolve_types(&mut collection, config)?;
        Ok(collection)
    }

    fn resolve(text: &str) -> Result<Collection, Error> {
        resolve_with(&[("test.proto", text)], &Config::default())
    }

    fn field<'a>(collection: &'a Collection, message: &str, name: &str) -> &'a Field {
        let message = collection.messages.iter().find(|m| m.full_name == message).unwrap();
        message.fields.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_candidates_innermost_first() {
        assert_eq!(candidates("B.C", "pkg.Outer"), vec!["pkg.Outer.B.C", "pkg.B.C", "B.C"]);
        assert_eq!(candidates(".x.Y", "pkg.Outer"), vec!["x.Y"]);
        assert_eq!(candidates("Y", ""), vec!["Y"]);
    }

    #[test]
    fn test_scoped_resolution_prefers_inner_types() {
        let collection = resolve(
            "package pkg;
             message Inner {}
             message Outer {
                 message Inner {}
                 Inner near = 1;
                 .pkg.Inner far = 2;
                 pkg.Inner qualified = 3;
             }",
        )
        .unwrap();
        assert_eq!(field(&collection, "pkg.Outer", "near").kind, FieldKind::Named(TypeRef::Message(MessageId(2))));
        assert_eq!(field(&collection, "pkg.Outer", "far").kind, FieldKind::Named(TypeRef::Message(MessageId(0))));
        assert_eq!(field(&collection, "pkg.Outer", "qualified").kind, FieldKind::Named(TypeRef::Message(MessageId(0))));
    }

    #[test]
    fn test_wire_types_are_assigned() {
        let collection = resolve(
            "enum E { A = 0; }
             message M {
                 int32 a = 1; sint64 b = 2; fixed32 c = 3; double d = 4;
                 string e = 5; E f = 6; M g = 7; map<string, int32> h = 8;
             }",
        )
        .unwrap();
        let wire_types: Vec<_> = collection.messages[0].fields.iter().map(wire_type).collect();
        assert_eq!(
            wire_types,
            vec![
                WireType::Varint,
                WireType::Varint,
                WireType::Fixed32,
                WireType::Fixed64,
                WireType::LengthDelimited,
                WireType::Varint,
                WireType::LengthDelimited,
                WireType::LengthDelimited,
            ]
        );
    }

    #[test]
    fn test_unknown_and_hidden_types() {
        let err = resolve("message M { Missing m = 1; }").unwrap_err();
        assert!(matches!(&err, Error::TypeResolution { name, hint: None, .. } if name == "Missing"), "{:?}", err);

        let files = [
            ("main.proto", "import \"a.proto\"; message M { B b = 1; }"),
            ("a.proto", "import \"b.proto\";"),
            ("b.proto", "message B {}"),
        ];
        let err = resolve_with(&files, &Config::default()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("\"b.proto\", which is not imported"), "{}", text);
    }

    #[test]
    fn test_public_imports_are_visible() {
        let files = [
            ("main.proto", "import \"a.proto\"; message M { B b = 1; }"),
            ("a.proto", "import public \"b.proto\";"),
            ("b.proto", "message B {}"),
        ];
        assert!(resolve_with(&files, &Config::default()).is_ok());
    }

    #[test]
    fn test_field_number_errors() {
        let cases = [
            ("message M { int32 a = 0; }", "between 1 and 536870911"),
            ("message M { int32 a = 536870912; }", "between 1 and 536870911"),
            ("message M { int32 a = 19500; }", "19000 to 19999"),
            ("message M { reserved 3 to 5; int32 a = 4; }", "is reserved"),
            ("message M { extensions 100 to max; int32 a = 200; }", "extension range"),
            ("message M { int32 a = 1; int32 b = 1; }", "already used by field \"a\""),
        ];
        for (text, needle) in cases {
            let err = resolve(text).unwrap_err();
            assert!(matches!(err, Error::FieldNumber { .. }), "{}: {:?}", text, err);
            assert!(err.to_string().contains(needle), "{}: {}", text, err);
        }
    }

    #[test]
    fn test_duplicate_names() {
        let err = resolve("message M {} message M {}").unwrap_err();
        assert!(matches!(&err, Error::DuplicateName { name, .. } if name == "M"), "{:?}", err);

        let err = resolve("message M { int32 a = 1; string a = 2; }").unwrap_err();
        assert!(matches!(&err, Error::DuplicateName { name, .. } if name == "M.a"), "{:?}", err);

        let err = resolve("message M { reserved \"a\"; int32 a = 1; }").unwrap_err();
        assert!(err.to_string().contains("is reserved"), "{}", err);
    }

    #[test]
    fn test_rust_identifier_clashes() {
        let err = resolve("message M { optional int32 fooBar = 1; optional int32 foo_bar = 2; }").unwrap_err();
        match &err {
            Error::DuplicateName { name, clash, .. } => {
                assert_eq!(name, "M.foo_bar");
                assert_eq!(
                    clash.as_deref(),
                    Some("\"fooBar\" and \"foo_bar\" both become the Rust identifier \"foo_bar\"")
                );
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("both become the Rust identifier"), "{}", err);

        let err = resolve("message M { optional int32 type = 1; optional int32 type_ = 2; }").unwrap_err();
        assert!(matches!(&err, Error::DuplicateName { name, .. } if name == "M.type_"), "{:?}", err);

        let err = resolve("enum E { FOO = 0; Foo = 1; }").unwrap_err();
        assert!(matches!(&err, Error::DuplicateName { name, clash: Some(_), .. } if name == "E.Foo"), "{:?}", err);

        let err = resolve("package geo; message Point {} message POINT {}").unwrap_err();
        assert!(matches!(&err, Error::DuplicateName { name, .. } if name == "geo.POINT"), "{:?}", err);

        // Across files sharing a package, which end up in one module.
        let err = resolve_with(
            &[
                ("a.proto", "package geo; import \"b.proto\"; message Shape { enum Kind { K = 0; } }"),
                ("b.proto", "package geo; message shape {}"),
            ],
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(&err, Error::DuplicateName { clash: Some(_), .. }), "{:?}", err);

        assert!(resolve("message M { optional int32 a = 1; optional int32 b = 2; message A {} message B {} }").is_ok());
    }

    #[test]
    fn test_packing_rules() {
        let proto2 = resolve(
            "message M { repeated int32 a = 1; repeated int32 b = 2 [packed = true]; repeated string c = 3; }",
        )
        .unwrap();
        assert!(!field(&proto2, "M", "a").packed);
        assert!(field(&proto2, "M", "b").packed);
        assert!(!field(&proto2, "M", "c").packed);

        let proto3 = resolve(
            "syntax = \"proto3\"; message M { repeated int32 a = 1; repeated int32 b = 2 [packed = false]; }",
        )
        .unwrap();
        assert!(field(&proto3, "M", "a").packed);
        assert!(!field(&proto3, "M", "b").packed);

        let err = resolve("message M { repeated string s = 1 [packed = true]; }").unwrap_err();
        assert!(err.to_string().contains("only allowed on repeated scalar"), "{}", err);
        let err = resolve("message M { optional int32 s = 1 [packed = true]; }").unwrap_err();
        assert!(err.to_string().contains("only allowed on repeated scalar"), "{}", err);
    }

    #[test]
    fn test_default_values() {
        let collection = resolve(
            "enum Color { RED = 0; GREEN = 1; }
             message M {
                 optional int32 a = 1 [default = -7];
                 optional double b = 2 [default = 3];
                 optional string c = 3 [default = \"hi\"];
                 optional Color d = 4 [default = GREEN];
                 optional bool e = 5 [default = true];
             }",
        )
        .unwrap();
        assert_eq!(field(&collection, "M", "a").default, Some(Constant::Integer(-7)));
        assert_eq!(field(&collection, "M", "b").default, Some(Constant::Float(3.0)));
        assert_eq!(field(&collection, "M", "c").default, Some(Constant::Str("hi".into())));
        assert_eq!(field(&collection, "M", "d").default, Some(Constant::Ident("GREEN".into())));

        let collection = resolve("message M { optional bytes raw = 1 [default = \"\\377\\xFE\"]; }").unwrap();
        assert_eq!(field(&collection, "M", "raw").default, Some(Constant::Bytes(vec![0xFF, 0xFE])));

        let cases = [
            ("message M { optional int32 a = 1 [default = 3000000000]; }", "out of range"),
            ("message M { optional uint32 a = 1 [default = -1]; }", "out of range"),
            ("message M { optional int32 a = 1 [default = \"x\"]; }", "not a valid int32"),
            ("message M { optional string a = 1 [default = \"\\377\"]; }", "not valid UTF-8"),
            ("message M { repeated int32 a = 1 [default = 1]; }", "only supported on optional"),
            ("message M { optional M a = 1 [default = 1]; }", "scalar and enum"),
            ("enum E { A = 0; } message M { optional E a = 1 [default = B]; }", "value of enum"),
            ("syntax = \"proto3\"; message M { optional int32 a = 1 [default = 1]; }", "proto3"),
        ];
        for (text, needle) in cases {
            let err = resolve(text).unwrap_err();
            assert!(err.to_string().contains(needle), "{}: {}", text, err);
        }
    }

    #[test]
    fn test_map_keys_are_checked() {
        let err = resolve("message M { map<double, int32> m = 1; }").unwrap_err();
        assert!(err.to_string().contains("integral, bool or string key"), "{}", err);
        let err = resolve("message V {} message M { map<V, int32> m = 1; }").unwrap_err();
        assert!(err.to_string().contains("integral, bool or string key"), "{}", err);
    }

    #[test]
    fn test_enum_rules() {
        assert!(resolve("enum E { A = 1; B = 1; }").is_ok());

        let mut strict = Config::default();
        strict.strict_enums(true);
        let cases = [
            ("enum E { A = 1; }", "must be zero"),
            ("enum E { A = 0; B = 0; }", "allow_alias"),
        ];
        for (text, needle) in cases {
            let err = resolve_with(&[("test.proto", text)], &strict).unwrap_err();
            assert!(err.to_string().contains(needle), "{}: {}", text, err);
        }
        assert!(resolve_with(&[("test.proto", "enum E { option allow_alias = true; A = 0; B = 0; }")], &strict).is_ok());

        let err = resolve("syntax = \"proto3\"; enum E { A = 1; }").unwrap_err();
        assert!(err.to_string().contains("must be zero"), "{}", err);
        let err = resolve("enum E {}").unwrap_err();
        assert!(err.to_string().contains("at least one value"), "{}", err);
        let err = resolve("enum E { A = 0; A = 1; }").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }), "{:?}", err);
    }

    #[test]
    fn test_reduced_numerics() {
        let mut reduced = Config::default();
        reduced.reduced_numerics(true);
        let err = resolve_with(&[("test.proto", "message M { int32 a = 1; map<string, fixed64> b = 2; }")], &reduced)
            .unwrap_err();
        assert!(matches!(&err, Error::TypeResolution { field, name, .. } if field == "b" && name == "fixed64"), "{:?}", err);
        assert!(resolve_with(&[("test.proto", "message M { int32 a = 1; float b = 2; }")], &reduced).is_ok());
    }

    #[test]
    fn test_required_recursion_is_rejected() {
        let err = resolve("message A { required B b = 1; } message B { required A a = 1; }").unwrap_err();
        assert!(err.to_string().contains("form a cycle"), "{}", err);
        assert!(resolve("message A { optional B b = 1; } message B { required A a = 1; }").is_ok());
    }

    #[test]
    fn test_recursive_fields_are_boxed() {
        let collection = resolve(
            "message Node { optional Node next = 1; repeated Node children = 2; Leaf leaf = 3; }
             message Leaf { int32 value = 1; }",
        )
        .unwrap();
        assert!(field(&collection, "Node", "next").boxed);
        assert!(!field(&collection, "Node", "children").boxed);
        assert!(!field(&collection, "Node", "leaf").boxed);
    }

    #[test]
    fn test_proto3_rejects_required() {
        let err = resolve("syntax = \"proto3\"; message M { required int32 a = 1; }").unwrap_err();
        assert!(err.to_string().contains("not allowed in proto3"), "{}", err);
    }
}
