use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::{
    error::{Error, Location},
    tokenizer::Token,
    types::{
        Constant, EnumDecl, EnumValueDecl, FieldDecl, FieldType, Import, ImportKind, Label,
        MessageDecl, NumberRange, OptionEntry, Reserved, ScalarKind, SchemaFile, Syntax,
    },
    utils::{quote, unescape},
};

use protowire_runtime::MAX_FIELD_NUMBER;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref INTEGER:    Regex = Regex::new(r"^(?:0[xX][0-9A-Fa-f]+|\d+)$").unwrap();
    static ref FLOAT:      Regex = Regex::new(r"^(?:\d+\.\d*|\.\d+|\d+[eE])").unwrap();
    static ref STRING:     Regex = Regex::new(r#"^["']"#).unwrap();
}

/// Parses one file's token stream into its declaration tree.
///
/// Stops at the first grammar violation; no partial tree is returned.
pub fn parse_schema(tokens: &[Token], path: &Path) -> Result<SchemaFile, Error> {
    if !tokens.last().is_some_and(Token::is_eof) {
        return Err(Error::schema_format(
            &Location::new(path, 1, 1),
            "token stream is missing its end marker",
        ));
    }
    Parser { tokens, index: 0, path }.file()
}

struct Parser<'a> {
    tokens: &'a [Token],
    index:  usize,
    path:   &'a Path,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[self.index.min(tokens.len() - 1)]
    }

    fn peek(&self, offset: usize) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[(self.index + offset).min(tokens.len() - 1)]
    }

    fn location(&self) -> Location {
        self.current().location(self.path)
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if !token.is_eof() {
            self.index += 1;
        }
        token
    }

    fn is(&self, text: &str) -> bool {
        self.current().text == text
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.is(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> Result<(), Error> {
        if !self.eat(text) {
            return Err(self.unexpected(&quote(text)));
        }
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.current();
        let found = if token.is_eof() { "end of file".to_string() } else { quote(&token.text) };
        self.error(format!("Expected {} but found {}", expected, found))
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::schema_format(&self.location(), message)
    }

    fn identifier(&mut self, what: &str) -> Result<(String, Location), Error> {
        let token = self.current();
        if !IDENTIFIER.is_match(&token.text) {
            return Err(self.unexpected(what));
        }
        self.advance();
        Ok((token.text.clone(), token.location(self.path)))
    }

    /// `ident ( "." ident )*`
    fn full_identifier(&mut self, what: &str) -> Result<(String, Location), Error> {
        let (mut name, location) = self.identifier(what)?;
        while self.eat(".") {
            let (part, _) = self.identifier(what)?;
            name.push('.');
            name.push_str(&part);
        }
        Ok((name, location))
    }

    /// A type reference, optionally fully qualified with a leading dot.
    fn type_name(&mut self) -> Result<(String, Location), Error> {
        let location = self.location();
        if self.eat(".") {
            let (name, _) = self.full_identifier("type name")?;
            return Ok((format!(".{}", name), location));
        }
        let (name, _) = self.full_identifier("type name")?;
        Ok((name, location))
    }

    /// A string literal where UTF-8 text is required.
    fn string(&mut self) -> Result<String, Error> {
        let location = self.location();
        String::from_utf8(self.string_bytes()?)
            .map_err(|_| Error::schema_format(&location, "string literal is not valid UTF-8"))
    }

    /// The raw bytes of one or more adjacent string literals.
    fn string_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::new();
        if !STRING.is_match(&self.current().text) {
            return Err(self.unexpected("string literal"));
        }
        // Adjacent literals concatenate.
        while STRING.is_match(&self.current().text) {
            let token = self.advance();
            let part = unescape(&token.text)
                .map_err(|message| Error::schema_format(&token.location(self.path), message))?;
            bytes.extend(part);
        }
        Ok(bytes)
    }

    fn integer(&mut self) -> Result<(i128, Location), Error> {
        let location = self.location();
        let negative = if self.eat("-") {
            true
        } else {
            self.eat("+");
            false
        };
        let token = self.current();
        if !INTEGER.is_match(&token.text) || FLOAT.is_match(&token.text) {
            return Err(self.unexpected("integer"));
        }
        let magnitude = parse_integer(&token.text).ok_or_else(|| {
            if is_octal_literal(&token.text) && !token.text.chars().all(|c| c.is_digit(8)) {
                self.error(format!("invalid octal literal {}", quote(&token.text)))
            } else {
                self.error(format!("integer {} is too large", quote(&token.text)))
            }
        })?;
        self.advance();
        let value = i128::from(magnitude);
        Ok((if negative { -value } else { value }, location))
    }

    fn constant(&mut self) -> Result<Constant, Error> {
        if STRING.is_match(&self.current().text) {
            return self.string_bytes().map(|bytes| match String::from_utf8(bytes) {
                Ok(text) => Constant::Str(text),
                Err(err) => Constant::Bytes(err.into_bytes()),
            });
        }
        if self.is("{") {
            return self.aggregate();
        }

        let negative = self.is("-");
        if negative || self.is("+") {
            let sign = if negative { -1.0 } else { 1.0 };
            let next = &self.peek(1).text;
            if next == "inf" || next == "nan" {
                self.advance();
                let value = if next == "inf" { f64::INFINITY } else { f64::NAN };
                self.advance();
                return Ok(Constant::Float(sign * value));
            }
            if FLOAT.is_match(next) {
                self.advance();
                let value = self.float()?;
                return Ok(Constant::Float(sign * value));
            }
            return self.integer().map(|(value, _)| Constant::Integer(value));
        }

        let text = &self.current().text;
        if FLOAT.is_match(text) {
            return self.float().map(Constant::Float);
        }
        if INTEGER.is_match(text) {
            return self.integer().map(|(value, _)| Constant::Integer(value));
        }
        if IDENTIFIER.is_match(text) {
            return self.full_identifier("constant").map(|(name, _)| Constant::Ident(name));
        }
        Err(self.unexpected("constant"))
    }

    fn float(&mut self) -> Result<f64, Error> {
        let token = self.advance();
        token
            .text
            .parse::<f64>()
            .map_err(|_| Error::schema_format(&token.location(self.path), format!("invalid float {}", quote(&token.text))))
    }

    fn aggregate(&mut self) -> Result<Constant, Error> {
        let mut depth = 0usize;
        let mut parts = Vec::new();
        loop {
            let token = self.current();
            if token.is_eof() {
                return Err(self.unexpected("\"}\""));
            }
            self.advance();
            match token.text.as_str() {
                "{" => depth += 1,
                "}" => depth -= 1,
                _ => {}
            }
            parts.push(token.text.clone());
            if depth == 0 {
                return Ok(Constant::Aggregate(parts.join(" ")));
            }
        }
    }

    /// `name` | `(ext.name)` followed by any `.sub` parts.
    fn option_name(&mut self) -> Result<String, Error> {
        let mut name = String::new();
        loop {
            if self.eat("(") {
                let (inner, _) = self.type_name()?;
                self.expect(")")?;
                name.push('(');
                name.push_str(&inner);
                name.push(')');
            } else {
                let (part, _) = self.identifier("option name")?;
                name.push_str(&part);
            }
            if !self.eat(".") {
                return Ok(name);
            }
            name.push('.');
        }
    }

    /// `option name = constant ;` with the keyword already consumed.
    fn option_statement(&mut self) -> Result<OptionEntry, Error> {
        let location = self.location();
        let name = self.option_name()?;
        self.expect("=")?;
        let value = self.constant()?;
        self.expect(";")?;
        Ok(OptionEntry { name, value, location })
    }

    /// `[ name = constant, ... ]` with the opening bracket already consumed.
    fn option_list(&mut self) -> Result<Vec<OptionEntry>, Error> {
        let mut options = Vec::new();
        loop {
            let location = self.location();
            let name = self.option_name()?;
            self.expect("=")?;
            let value = self.constant()?;
            options.push(OptionEntry { name, value, location });
            if !self.eat(",") {
                break;
            }
        }
        self.expect("]")?;
        Ok(options)
    }

    fn file(mut self) -> Result<SchemaFile, Error> {
        let mut syntax = Syntax::Proto2;
        if self.eat("syntax") {
            self.expect("=")?;
            let location = self.location();
            syntax = match self.string()?.as_str() {
                "proto2" => Syntax::Proto2,
                "proto3" => Syntax::Proto3,
                other => {
                    return Err(Error::schema_format(
                        &location,
                        format!("unknown syntax {}, expected \"proto2\" or \"proto3\"", quote(other)),
                    ))
                }
            };
            self.expect(";")?;
        }

        let mut file = SchemaFile {
            path:     self.path.to_path_buf(),
            syntax,
            package:  None,
            imports:  Vec::new(),
            options:  Vec::new(),
            messages: Vec::new(),
            enums:    Vec::new(),
        };

        while !self.current().is_eof() {
            let location = self.location();
            match self.current().text.as_str() {
                "package" => {
                    self.advance();
                    if file.package.is_some() {
                        return Err(Error::schema_format(&location, "multiple package names specified"));
                    }
                    let (name, _) = self.full_identifier("package name")?;
                    self.expect(";")?;
                    file.package = Some(name);
                }
                "import" => {
                    self.advance();
                    let kind = if self.eat("public") {
                        ImportKind::Public
                    } else if self.eat("weak") {
                        ImportKind::Weak
                    } else {
                        ImportKind::Default
                    };
                    let path = self.string()?;
                    self.expect(";")?;
                    file.imports.push(Import { path, kind, location });
                }
                "option" => {
                    self.advance();
                    file.options.push(self.option_statement()?);
                }
                "message" => {
                    self.advance();
                    file.messages.push(self.message()?);
                }
                "enum" => {
                    self.advance();
                    file.enums.push(self.enumeration()?);
                }
                "service" | "extend" => self.skip_block()?,
                ";" => {
                    self.advance();
                }
                _ => return Err(self.unexpected("a top-level declaration")),
            }
        }

        Ok(file)
    }

    /// Skips a `service` or `extend` block as one balanced brace group.
    fn skip_block(&mut self) -> Result<(), Error> {
        let keyword = self.advance();
        let location = keyword.location(self.path);
        while !self.is("{") {
            if self.current().is_eof() {
                return Err(self.unexpected("\"{\""));
            }
            self.advance();
        }
        let mut depth = 0usize;
        loop {
            let token = self.advance();
            match token.text.as_str() {
                "{" => depth += 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                "" => return Err(self.unexpected("\"}\"")),
                _ => {}
            }
        }
        warn!("{}: skipping {} block, it is not generated", location, keyword.text);
        Ok(())
    }

    fn message(&mut self) -> Result<MessageDecl, Error> {
        let (name, location) = self.identifier("message name")?;
        self.expect("{")?;

        let mut message = MessageDecl {
            name,
            location,
            fields:     Vec::new(),
            messages:   Vec::new(),
            enums:      Vec::new(),
            reserved:   Vec::new(),
            extensions: Vec::new(),
            options:    Vec::new(),
        };

        while !self.eat("}") {
            match self.current().text.as_str() {
                "message" => {
                    self.advance();
                    message.messages.push(self.message()?);
                }
                "enum" => {
                    self.advance();
                    message.enums.push(self.enumeration()?);
                }
                "option" => {
                    self.advance();
                    message.options.push(self.option_statement()?);
                }
                "reserved" => {
                    self.advance();
                    message.reserved.extend(self.reserved(i128::from(MAX_FIELD_NUMBER))?);
                }
                "extensions" => {
                    self.advance();
                    message.extensions.extend(self.ranges(i128::from(MAX_FIELD_NUMBER))?);
                    if self.eat("[") {
                        self.option_list()?;
                    }
                    self.expect(";")?;
                }
                "oneof" => {
                    self.advance();
                    self.oneof(&mut message)?;
                }
                "extend" => self.skip_block()?,
                ";" => {
                    self.advance();
                }
                "" => return Err(self.unexpected("\"}\"")),
                _ => message.fields.push(self.field(None)?),
            }
        }

        Ok(message)
    }

    fn oneof(&mut self, message: &mut MessageDecl) -> Result<(), Error> {
        let (name, _) = self.identifier("oneof name")?;
        self.expect("{")?;
        while !self.eat("}") {
            match self.current().text.as_str() {
                "option" => {
                    self.advance();
                    self.option_statement()?;
                }
                ";" => {
                    self.advance();
                }
                "" => return Err(self.unexpected("\"}\"")),
                _ => message.fields.push(self.field(Some(&name))?),
            }
        }
        Ok(())
    }

    fn field(&mut self, oneof: Option<&str>) -> Result<FieldDecl, Error> {
        let label_location = self.location();
        let mut label = match self.current().text.as_str() {
            "optional" => Label::Optional,
            "required" => Label::Required,
            "repeated" => Label::Repeated,
            _ => Label::Implicit,
        };
        if label != Label::Implicit {
            self.advance();
            if oneof.is_some() {
                return Err(Error::schema_format(&label_location, "fields in oneofs must not have labels"));
            }
        }

        if self.is("group") {
            return Err(self.error("groups are not supported"));
        }

        let type_ = if self.is("map") && self.peek(1).text == "<" {
            if label != Label::Implicit {
                return Err(Error::schema_format(&label_location, "map fields cannot have labels"));
            }
            self.advance();
            self.advance();
            let key = self.field_type()?;
            self.expect(",")?;
            let value = self.field_type()?;
            self.expect(">")?;
            FieldType::Map { key: Box::new(key), value: Box::new(value) }
        } else {
            self.field_type()?
        };

        let (name, location) = self.identifier("field name")?;
        self.expect("=")?;
        let (number, _) = self.integer()?;
        let options = if self.eat("[") { self.option_list()? } else { Vec::new() };
        self.expect(";")?;

        if oneof.is_some() {
            label = Label::Optional;
        }

        Ok(FieldDecl {
            name,
            location,
            label,
            type_,
            number,
            options,
            oneof: oneof.map(str::to_string),
        })
    }

    fn field_type(&mut self) -> Result<FieldType, Error> {
        let (name, _) = self.type_name()?;
        Ok(match ScalarKind::from_name(&name) {
            Some(kind) => FieldType::Scalar(kind),
            None => FieldType::Named(name),
        })
    }

    fn enumeration(&mut self) -> Result<EnumDecl, Error> {
        let (name, location) = self.identifier("enum name")?;
        self.expect("{")?;

        let mut decl = EnumDecl {
            name,
            location,
            values:   Vec::new(),
            reserved: Vec::new(),
            options:  Vec::new(),
        };

        while !self.eat("}") {
            match self.current().text.as_str() {
                "option" => {
                    self.advance();
                    decl.options.push(self.option_statement()?);
                }
                "reserved" => {
                    self.advance();
                    decl.reserved.extend(self.reserved(i128::from(i32::MAX))?);
                }
                ";" => {
                    self.advance();
                }
                "" => return Err(self.unexpected("\"}\"")),
                _ => {
                    let (name, location) = self.identifier("enum value name")?;
                    self.expect("=")?;
                    let (number, _) = self.integer()?;
                    let options = if self.eat("[") { self.option_list()? } else { Vec::new() };
                    self.expect(";")?;
                    decl.values.push(EnumValueDecl { name, location, number, options });
                }
            }
        }

        Ok(decl)
    }

    /// `reserved` body: either quoted names or number ranges, then `;`.
    fn reserved(&mut self, max: i128) -> Result<Vec<Reserved>, Error> {
        let mut reserved = Vec::new();
        if STRING.is_match(&self.current().text) {
            loop {
                reserved.push(Reserved::Name(self.string()?));
                if !self.eat(",") {
                    break;
                }
            }
        } else {
            reserved.extend(self.ranges(max)?.into_iter().map(Reserved::Range));
        }
        self.expect(";")?;
        Ok(reserved)
    }

    /// `N [to (M | max)] ( , ... )*`; `max` becomes the given upper bound.
    fn ranges(&mut self, max: i128) -> Result<Vec<NumberRange>, Error> {
        let mut ranges = Vec::new();
        loop {
            let (start, location) = self.integer()?;
            let end = if self.eat("to") {
                if self.eat("max") {
                    max
                } else {
                    self.integer()?.0
                }
            } else {
                start
            };
            if end < start {
                return Err(Error::schema_format(
                    &location,
                    format!("range end {} is smaller than range start {}", end, start),
                ));
            }
            ranges.push(NumberRange { start, end });
            if !self.eat(",") {
                return Ok(ranges);
            }
        }
    }
}

fn is_octal_literal(text: &str) -> bool {
    text.len() > 1 && text.starts_with('0') && !text.starts_with("0x") && !text.starts_with("0X")
}

fn parse_integer(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if is_octal_literal(text) {
        u64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse::<u64>().ok()
    }
}
