use protowire_runtime::WireType;

use crate::types::ScalarKind;

/// How values of one field kind are framed on the wire and which runtime
/// calls move them in and out of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCodec {
    pub wire_type: WireType,
    /// Whether repeated values may share one length-delimited record.
    pub packable:  bool,
    /// Rust type of a single decoded value.
    pub rust_type: &'static str,
    /// `ByteBuffer` method reading one value.
    pub reader:    &'static str,
    /// `ByteBufferMut` method writing one value.
    pub writer:    &'static str,
    /// Values are `Copy` and passed to the writer by value.
    pub copy:      bool,
}

impl FieldCodec {
    const fn new(
        wire_type: WireType,
        rust_type: &'static str,
        reader: &'static str,
        writer: &'static str,
    ) -> FieldCodec {
        FieldCodec {
            packable: !matches!(wire_type, WireType::LengthDelimited),
            wire_type,
            rust_type,
            reader,
            writer,
            copy: !matches!(wire_type, WireType::LengthDelimited),
        }
    }

    pub fn for_scalar(kind: ScalarKind) -> FieldCodec {
        use WireType::*;
        match kind {
            ScalarKind::Double   => FieldCodec::new(Fixed64, "f64", "read_double", "write_double"),
            ScalarKind::Float    => FieldCodec::new(Fixed32, "f32", "read_float", "write_float"),
            ScalarKind::Int32    => FieldCodec::new(Varint, "i32", "read_int32", "write_int32"),
            ScalarKind::Int64    => FieldCodec::new(Varint, "i64", "read_int64", "write_int64"),
            ScalarKind::Uint32   => FieldCodec::new(Varint, "u32", "read_uint32", "write_uint32"),
            ScalarKind::Uint64   => FieldCodec::new(Varint, "u64", "read_uint64", "write_uint64"),
            ScalarKind::Sint32   => FieldCodec::new(Varint, "i32", "read_sint32", "write_sint32"),
            ScalarKind::Sint64   => FieldCodec::new(Varint, "i64", "read_sint64", "write_sint64"),
            ScalarKind::Fixed32  => FieldCodec::new(Fixed32, "u32", "read_fixed32", "write_fixed32"),
            ScalarKind::Fixed64  => FieldCodec::new(Fixed64, "u64", "read_fixed64", "write_fixed64"),
            ScalarKind::Sfixed32 => FieldCodec::new(Fixed32, "i32", "read_sfixed32", "write_sfixed32"),
            ScalarKind::Sfixed64 => FieldCodec::new(Fixed64, "i64", "read_sfixed64", "write_sfixed64"),
            ScalarKind::Bool     => FieldCodec::new(Varint, "bool", "read_bool", "write_bool"),
            ScalarKind::String   => FieldCodec::new(LengthDelimited, "::std::string::String", "read_string", "write_string"),
            ScalarKind::Bytes    => FieldCodec::new(LengthDelimited, "::std::vec::Vec<u8>", "read_length_delimited", "write_length_delimited"),
        }
    }

    /// Enums travel as int32 varints.
    pub fn for_enum() -> FieldCodec {
        FieldCodec {
            rust_type: "i32",
            ..FieldCodec::for_scalar(ScalarKind::Int32)
        }
    }

    /// Embedded messages and map entries are length-delimited records.
    pub fn for_message() -> FieldCodec {
        FieldCodec::new(WireType::LengthDelimited, "", "read_length_delimited", "write_length_delimited")
    }

    /// Expression turning the raw reader result into an owned value.
    pub fn read_expr(&self, buffer: &str) -> String {
        match self.reader {
            "read_length_delimited" => format!("{}.{}()?.to_vec()", buffer, self.reader),
            reader => format!("{}.{}()?", buffer, reader),
        }
    }

    /// Statement writing `value`. `by_ref` says whether `value` is already a
    /// reference to the stored value or names the place itself.
    pub fn write_stmt(&self, buffer: &str, value: &str, by_ref: bool) -> String {
        let operand = match (self.copy, by_ref) {
            (true, true) => format!("*{}", value),
            (false, false) => format!("&{}", value),
            _ => value.to_string(),
        };
        format!("{}.{}({});", buffer, self.writer, operand)
    }
}

/// Runtime path of a wire type constant, e.g. `::rt::WireType::Varint`.
pub fn wire_type_path(runtime: &str, wire_type: WireType) -> String {
    let name = match wire_type {
        WireType::Varint => "Varint",
        WireType::Fixed64 => "Fixed64",
        WireType::LengthDelimited => "LengthDelimited",
        WireType::Fixed32 => "Fixed32",
    };
    format!("{}::WireType::{}", runtime, name)
}
