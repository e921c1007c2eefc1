use std::collections::BTreeMap;

use protowire_example::{
    common::{Status, Timestamp},
    geometry::{Point, Polygon},
    scalars::{settings::Level, AllScalars, Node, Settings},
};
use protowire_runtime::{ByteBufferMut, DecodeError, Message, WireType};

fn roundtrip<M: Message + PartialEq + std::fmt::Debug>(value: &M) {
    let bytes = value.serialize();
    assert_eq!(&M::deserialize(&bytes).unwrap(), value, "bytes {:02x?}", bytes);
}

#[test]
fn test_point_bytes() {
    assert_eq!(Point { x: 1, y: 0 }.serialize(), [0x08, 0x01]);
    assert_eq!(Point { x: 150, y: 0 }.serialize(), [0x08, 0x96, 0x01]);
    assert_eq!(Point::default().serialize(), Vec::<u8>::new());

    // int32 negatives are sign-extended to ten bytes.
    let bytes = Point { x: 0, y: -1 }.serialize();
    assert_eq!(bytes.len(), 11);
    assert_eq!(bytes[0], 0x10);
    roundtrip(&Point { x: 0, y: -1 });
}

#[test]
fn test_packed_by_default_in_proto3() {
    let polygon = Polygon { weights: vec![1, 300], ..Default::default() };
    assert_eq!(polygon.serialize(), [0x22, 0x03, 0x01, 0xAC, 0x02]);

    // Unpacked input is accepted for packable fields.
    let decoded = Polygon::deserialize(&[0x20, 0x01, 0x20, 0xAC, 0x02]).unwrap();
    assert_eq!(decoded.weights, vec![1, 300]);
}

#[test]
fn test_polygon_roundtrip() {
    let mut anchors = BTreeMap::new();
    anchors.insert("origin".to_string(), Point { x: 0, y: 0 });
    anchors.insert("tip".to_string(), Point { x: -3, y: 9 });

    let polygon = Polygon {
        name:     "triangle".to_string(),
        vertices: vec![Point { x: 0, y: 0 }, Point { x: 4, y: 0 }, Point { x: 0, y: 3 }],
        weights:  vec![-1, 0, i32::MAX],
        anchors,
        status:   Status::StatusActive,
        area:     Some(6.0),
        created:  Some(Timestamp { seconds: 1_700_000_000, nanos: 5 }),
    };
    roundtrip(&polygon);

    // Explicit presence keeps a zero value on the wire.
    let zero_area = Polygon { area: Some(0.0), ..Default::default() };
    assert_eq!(zero_area.serialize(), [0x39, 0, 0, 0, 0, 0, 0, 0, 0]);
    roundtrip(&zero_area);
}

#[test]
fn test_scalar_extremes() {
    let zero = AllScalars {
        f_double:   Some(0.0),
        f_float:    Some(0.0),
        f_int32:    Some(0),
        f_int64:    Some(0),
        f_uint32:   Some(0),
        f_uint64:   Some(0),
        f_sint32:   Some(0),
        f_sint64:   Some(0),
        f_fixed32:  Some(0),
        f_fixed64:  Some(0),
        f_sfixed32: Some(0),
        f_sfixed64: Some(0),
        f_bool:     Some(false),
        f_string:   Some(String::new()),
        f_bytes:    Some(Vec::new()),
    };
    let min = AllScalars {
        f_double:   Some(f64::MIN),
        f_float:    Some(f32::MIN),
        f_int32:    Some(i32::MIN),
        f_int64:    Some(i64::MIN),
        f_uint32:   Some(u32::MIN),
        f_uint64:   Some(u64::MIN),
        f_sint32:   Some(i32::MIN),
        f_sint64:   Some(i64::MIN),
        f_fixed32:  Some(u32::MIN),
        f_fixed64:  Some(u64::MIN),
        f_sfixed32: Some(i32::MIN),
        f_sfixed64: Some(i64::MIN),
        f_bool:     Some(false),
        f_string:   Some("ünïcödé".to_string()),
        f_bytes:    Some(vec![0x00, 0xFF]),
    };
    let max = AllScalars {
        f_double:   Some(f64::MAX),
        f_float:    Some(f32::MAX),
        f_int32:    Some(i32::MAX),
        f_int64:    Some(i64::MAX),
        f_uint32:   Some(u32::MAX),
        f_uint64:   Some(u64::MAX),
        f_sint32:   Some(i32::MAX),
        f_sint64:   Some(i64::MAX),
        f_fixed32:  Some(u32::MAX),
        f_fixed64:  Some(u64::MAX),
        f_sfixed32: Some(i32::MAX),
        f_sfixed64: Some(i64::MAX),
        f_bool:     Some(true),
        f_string:   Some("x".repeat(300)),
        f_bytes:    Some(vec![0xAB; 200]),
    };
    for value in [&zero, &min, &max, &AllScalars::default()] {
        roundtrip(value);
    }
    assert!(AllScalars::default().serialize().is_empty());
    assert_eq!(AllScalars { f_sint32: Some(-1), ..Default::default() }.serialize(), [0x38, 0x01]);
}

#[test]
fn test_unknown_fields_are_skipped() {
    let mut bb = ByteBufferMut::new();
    bb.write_tag(99, WireType::Varint);
    bb.write_uint64(u64::MAX);
    bb.write_tag(1, WireType::Varint);
    bb.write_int32(7);
    bb.write_tag(100, WireType::Fixed32);
    bb.write_fixed32(1);
    bb.write_tag(101, WireType::LengthDelimited);
    bb.write_string("ignored");
    bb.write_tag(102, WireType::Fixed64);
    bb.write_fixed64(2);
    bb.write_tag(2, WireType::Varint);
    bb.write_int32(8);

    assert_eq!(Point::deserialize(&bb.data()).unwrap(), Point { x: 7, y: 8 });
}

#[test]
fn test_decode_errors() {
    assert_eq!(
        Point::deserialize(&[0x0A, 0x00]),
        Err(DecodeError::UnexpectedWireType {
            field:    1,
            expected: WireType::Varint,
            found:    WireType::LengthDelimited,
        })
    );
    assert_eq!(Point::deserialize(&[0x08]), Err(DecodeError::UnexpectedEof));
    assert_eq!(Polygon::deserialize(&[0x0A, 0x05, b'a']), Err(DecodeError::InvalidLength(5)));
}

#[test]
fn test_required_fields() {
    assert_eq!(
        Settings::deserialize(&[]),
        Err(DecodeError::MissingField { message: "scalars.Settings", field: "name" })
    );

    // Required fields are written even when empty.
    let settings = Settings::default();
    assert_eq!(settings.serialize(), [0x0A, 0x00]);
    roundtrip(&settings);
}

#[test]
fn test_declared_defaults() {
    let unset = Settings::default();
    assert_eq!(unset.retries_or_default(), 3);
    assert_eq!(unset.greeting_or_default(), "hello");
    assert_eq!(unset.level_or_default(), Level::LevelHigh);
    assert_eq!(unset.magic_or_default(), b"\x7fPW");

    let set = Settings {
        retries: Some(0),
        greeting: Some("hi".to_string()),
        level: Some(Level::LevelLow),
        ..Default::default()
    };
    assert_eq!(set.retries_or_default(), 0);
    assert_eq!(set.greeting_or_default(), "hi");
    assert_eq!(set.level_or_default(), Level::LevelLow);
}

#[test]
fn test_proto2_packing_is_opt_in() {
    let settings = Settings { samples: vec![3, 4], offsets: vec![-1, 1], ..Default::default() };
    let bytes = settings.serialize();
    assert_eq!(
        bytes,
        [
            0x0A, 0x00, // name
            0x2A, 0x02, 0x03, 0x04, // samples, packed
            0x30, 0x01, 0x30, 0x02, // offsets, one tag per element
        ]
    );
    roundtrip(&settings);
}

#[test]
fn test_enums() {
    assert_eq!(Status::from_i32(2), Some(Status::StatusRetired));
    assert_eq!(Status::from_i32(9), None);
    assert_eq!(Status::default(), Status::StatusUnknown);
    assert_eq!(Status::StatusActive.as_str_name(), "STATUS_ACTIVE");

    // Unknown numbers are dropped, leaving the field at its default.
    let decoded = Polygon::deserialize(&[0x30, 0x2A]).unwrap();
    assert_eq!(decoded.status, Status::StatusUnknown);
}

#[test]
fn test_recursive_messages() {
    let tree = Node {
        value:    Some(1),
        next:     Some(Box::new(Node { value: Some(2), next: Some(Box::new(Node::default())), children: vec![] })),
        children: vec![Node { value: Some(3), ..Default::default() }, Node::default()],
    };
    roundtrip(&tree);
}

#[test]
fn test_concatenation_merges() {
    let first = Polygon {
        name:    "a".to_string(),
        weights: vec![1],
        created: Some(Timestamp { seconds: 10, nanos: 0 }),
        ..Default::default()
    };
    let second = Polygon {
        name:    "b".to_string(),
        weights: vec![2],
        created: Some(Timestamp { seconds: 0, nanos: 7 }),
        ..Default::default()
    };
    let mut bytes = first.serialize();
    bytes.extend(second.serialize());

    let merged = Polygon::deserialize(&bytes).unwrap();
    assert_eq!(merged.name, "b");
    assert_eq!(merged.weights, vec![1, 2]);
    assert_eq!(merged.created, Some(Timestamp { seconds: 10, nanos: 7 }));
}
