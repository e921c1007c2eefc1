//! Runtime helpers for reading and writing the protocol-buffer wire format.
//! Code emitted by `protowire-compiler` calls into this crate through the
//! [`Message`] trait and the [`ByteBuffer`] / [`ByteBufferMut`] pair.
//!
//! ```
//! use protowire_runtime::*;
//!
//! // `repeated int32 values = 4 [packed = true]` holding [1, 300]
//! let mut packed = ByteBufferMut::new();
//! packed.write_int32(1);
//! packed.write_int32(300);
//!
//! let mut bb = ByteBufferMut::new();
//! bb.write_tag(4, WireType::LengthDelimited);
//! bb.write_length_delimited(packed.as_slice());
//! let bytes = bb.data();
//! assert_eq!(bytes, [0x22, 0x03, 0x01, 0xAC, 0x02]);
//!
//! let mut reader = ByteBuffer::new(&bytes);
//! assert_eq!(reader.read_tag(), Ok((4, WireType::LengthDelimited)));
//! let mut inner = ByteBuffer::new(reader.read_length_delimited().unwrap());
//! assert_eq!(inner.read_int32(), Ok(1));
//! assert_eq!(inner.read_int32(), Ok(300));
//! assert!(inner.is_empty() && reader.is_empty());
//! ```

mod wire;

pub use wire::*;

/// Source text of the runtime module, emitted next to generated code when the
/// caller asks for a self-contained output tree.
pub const RUNTIME_SOURCE: &str = include_str!("wire.rs");

/// Version stamped into the header of the emitted runtime file.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");
