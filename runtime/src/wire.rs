// Runtime support for protowire generated code.
//
// This module is self-contained (std only) so that it can be copied verbatim
// next to generated code when depending on the runtime crate is not an option.

use std::fmt;
use std::str;

/// Largest field number a tag can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// An error raised while decoding a message from its wire representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended in the middle of a value.
    UnexpectedEof,
    /// A varint did not terminate within 10 bytes.
    VarintOverflow,
    /// A tag carried a wire type this runtime does not understand (3, 4, 6, 7).
    InvalidWireType(u32),
    /// A tag carried field number 0 or a number above [`MAX_FIELD_NUMBER`].
    InvalidFieldNumber(u64),
    /// A known field arrived framed with a different wire type than declared.
    UnexpectedWireType {
        field:    u32,
        expected: WireType,
        found:    WireType,
    },
    /// A length prefix pointed past the end of the buffer.
    InvalidLength(u64),
    /// A string field held bytes that are not valid UTF-8.
    InvalidUtf8,
    /// A `required` field never appeared in the input.
    MissingField {
        message: &'static str,
        field:   &'static str,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnexpectedEof => write!(f, "unexpected end of buffer"),
            DecodeError::VarintOverflow => write!(f, "varint is longer than 10 bytes"),
            DecodeError::InvalidWireType(value) => write!(f, "invalid wire type {}", value),
            DecodeError::InvalidFieldNumber(value) => write!(f, "invalid field number {}", value),
            DecodeError::UnexpectedWireType { field, expected, found } => write!(
                f,
                "field {} expected wire type {:?} but found {:?}",
                field, expected, found
            ),
            DecodeError::InvalidLength(len) => {
                write!(f, "length {} exceeds the remaining buffer", len)
            }
            DecodeError::InvalidUtf8 => write!(f, "string is not valid utf-8"),
            DecodeError::MissingField { message, field } => {
                write!(f, "required field {}.{} is missing", message, field)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// How a field payload is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireType {
    Varint          = 0,
    Fixed64         = 1,
    LengthDelimited = 2,
    Fixed32         = 5,
}

impl WireType {
    /// Maps the low three bits of a tag back to a wire type.
    pub fn from_u32(value: u32) -> Result<WireType, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(DecodeError::InvalidWireType(other)),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Packs a field number and wire type into the integer written before a field.
pub fn encode_tag(field_number: u32, wire_type: WireType) -> u64 {
    ((field_number as u64) << 3) | wire_type.as_u32() as u64
}

/// Maps a signed 32-bit integer so that small magnitudes stay short as varints.
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Maps a signed 64-bit integer so that small magnitudes stay short as varints.
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Number of bytes `value` occupies once varint encoded.
pub fn encoded_len_varint(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Fails unless a known field arrived with the wire type its declaration implies.
pub fn expect_wire_type(
    field: u32,
    found: WireType,
    expected: WireType,
) -> Result<(), DecodeError> {
    if found == expected {
        Ok(())
    } else {
        Err(DecodeError::UnexpectedWireType { field, expected, found })
    }
}

/// A byte buffer meant for reading wire data. The lifetime of the buffer
/// is tied to the slice it wraps.
pub struct ByteBuffer<'a> {
    data:  &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current read position.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.index >= self.data.len()
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        if self.index >= self.data.len() {
            Err(DecodeError::UnexpectedEof)
        } else {
            let value = self.data[self.index];
            self.index += 1;
            Ok(value)
        }
    }

    /// Reads `len` raw bytes without any framing.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            Err(DecodeError::UnexpectedEof)
        } else {
            let value = &self.data[self.index..self.index + len];
            self.index += len;
            Ok(value)
        }
    }

    /// Reads a little-endian base-128 varint of at most 10 bytes.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        for group in 0..10 {
            let byte = self.read_byte()?;
            if group == 9 && byte > 1 {
                return Err(DecodeError::VarintOverflow);
            }
            result |= ((byte & 0x7F) as u64) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DecodeError::VarintOverflow)
    }

    pub fn read_int32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_varint()? as i32)
    }

    pub fn read_int64(&mut self) -> Result<i64, DecodeError> {
        Ok(self.read_varint()? as i64)
    }

    pub fn read_uint32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_varint()? as u32)
    }

    pub fn read_uint64(&mut self) -> Result<u64, DecodeError> {
        self.read_varint()
    }

    pub fn read_sint32(&mut self) -> Result<i32, DecodeError> {
        Ok(zigzag_decode32(self.read_varint()? as u32))
    }

    pub fn read_sint64(&mut self) -> Result<i64, DecodeError> {
        Ok(zigzag_decode64(self.read_varint()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_varint()? != 0)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    pub fn read_sfixed32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_fixed32()? as i32)
    }

    pub fn read_sfixed64(&mut self) -> Result<i64, DecodeError> {
        Ok(self.read_fixed64()? as i64)
    }

    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_fixed32()?))
    }

    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.read_fixed64()?))
    }

    /// Reads a varint length prefix and returns the bytes it frames.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint()?;
        if len > self.remaining() as u64 {
            return Err(DecodeError::InvalidLength(len));
        }
        self.read_bytes(len as usize)
    }

    /// Reads a length-delimited UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_length_delimited()?;
        str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Reads a tag and splits it into field number and wire type.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), DecodeError> {
        let key = self.read_varint()?;
        let wire_type = WireType::from_u32((key & 0x7) as u32)?;
        let number = key >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER as u64 {
            return Err(DecodeError::InvalidFieldNumber(number));
        }
        Ok((number as u32, wire_type))
    }

    /// Consumes one value of the given wire type without interpreting it.
    pub fn skip_field(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.read_bytes(8)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::Fixed32 => {
                self.read_bytes(4)?;
            }
        }
        Ok(())
    }
}

/// A byte buffer meant for writing wire data.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Appends raw bytes without any framing.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    /// Appends a little-endian base-128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.data.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.data.push(value as u8);
    }

    /// Negative values are sign-extended and always take 10 bytes.
    pub fn write_int32(&mut self, value: i32) {
        self.write_varint(value as i64 as u64);
    }

    pub fn write_int64(&mut self, value: i64) {
        self.write_varint(value as u64);
    }

    pub fn write_uint32(&mut self, value: u32) {
        self.write_varint(value as u64);
    }

    pub fn write_uint64(&mut self, value: u64) {
        self.write_varint(value);
    }

    pub fn write_sint32(&mut self, value: i32) {
        self.write_varint(zigzag_encode32(value) as u64);
    }

    pub fn write_sint64(&mut self, value: i64) {
        self.write_varint(zigzag_encode64(value));
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_varint(value as u64);
    }

    pub fn write_fixed32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_sfixed32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_sfixed64(&mut self, value: i64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_float(&mut self, value: f32) {
        self.write_fixed32(value.to_bits());
    }

    pub fn write_double(&mut self, value: f64) {
        self.write_fixed64(value.to_bits());
    }

    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
        self.write_varint(encode_tag(field_number, wire_type));
    }

    /// Appends a varint length prefix followed by `value`.
    pub fn write_length_delimited(&mut self, value: &[u8]) {
        self.write_varint(value.len() as u64);
        self.data.extend_from_slice(value);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_length_delimited(value.as_bytes());
    }
}

/// Implemented by every generated message type.
pub trait Message: Default {
    /// Writes every present field in declaration order.
    fn write_to(&self, bb: &mut ByteBufferMut);

    /// Reads fields until `bb` is exhausted, merging them into `self`.
    /// Unknown field numbers are skipped.
    fn merge_from(&mut self, bb: &mut ByteBuffer<'_>) -> Result<(), DecodeError>;

    /// Serializes this instance into a byte vector.
    fn serialize(&self) -> Vec<u8> {
        let mut bb = ByteBufferMut::new();
        self.write_to(&mut bb);
        bb.data()
    }

    /// Deserializes a fresh instance from `data`.
    fn deserialize(data: &[u8]) -> Result<Self, DecodeError> {
        let mut value = Self::default();
        value.merge_from(&mut ByteBuffer::new(data))?;
        Ok(value)
    }
}
