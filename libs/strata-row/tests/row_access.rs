use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, ErrorKind, Partitioner, ProtocolVersion, RowError, Token, UdtField, UserType};
use strata_row::codec::primitive;
use strata_row::{
    CodecRegistry, ColumnDefinition, ColumnDefinitions, GettableData, Row, TupleValue, TypeCodec, UdtValue, Value,
};

fn column(name: &str, data_type: DataType) -> ColumnDefinition {
    ColumnDefinition::new("ks", "t", name, data_type)
}

fn slot(raw: impl AsRef<[u8]>) -> Option<Bytes> {
    Some(Bytes::copy_from_slice(raw.as_ref()))
}

fn row(columns: Vec<ColumnDefinition>, values: Vec<Option<Bytes>>) -> Row {
    let defs = Arc::new(ColumnDefinitions::new(columns, CodecRegistry::new()));
    Row::new(defs, values, ProtocolVersion::V4).unwrap()
}

fn encode<T: 'static>(codec: &dyn TypeCodec<T>, value: &T) -> Vec<u8> {
    codec.encode(value, ProtocolVersion::V4).unwrap()
}

// ════════════════════════════════════════════════════════════════
//  Scenarios
// ════════════════════════════════════════════════════════════════

#[test]
fn id_and_name_by_position_and_by_name() {
    let row = row(
        vec![column("id", DataType::Int), column("name", DataType::Text)],
        vec![slot(42i32.to_be_bytes()), slot(b"Ada")],
    );
    assert_eq!(row.get_int(0).unwrap(), 42);
    assert_eq!(row.get_int("id").unwrap(), 42);
    assert_eq!(row.get_string(1).unwrap().as_deref(), Some("Ada"));
    assert_eq!(row.get_string("name").unwrap().as_deref(), Some("Ada"));
    assert_eq!(row.to_string(), "Row[42, 'Ada']");
}

#[test]
fn empty_list_is_not_null() {
    let codec = CodecRegistry::new().codec_for::<Vec<String>>(&DataType::list(DataType::Text)).unwrap();
    let raw = encode(&*codec, &vec![]);
    let row = row(vec![column("tags", DataType::list(DataType::Text))], vec![slot(&raw)]);
    assert_eq!(row.get_list::<String, _>("tags").unwrap(), Vec::<String>::new());
    assert!(!row.is_null("tags").unwrap());
}

#[test]
fn zero_length_list_buffer_is_empty_list() {
    let row = row(vec![column("tags", DataType::list(DataType::Text))], vec![slot(b"")]);
    assert!(row.get_list::<String, _>("tags").unwrap().is_empty());
    assert_eq!(row.get::<Vec<String>, _>("tags").unwrap(), Some(vec![]));
}

/// Numeric accessors cannot tell a null `int` from a stored zero; callers
/// that care must ask `is_null`.
#[test]
fn null_int_reads_as_zero() {
    let row = row(vec![column("count", DataType::Int)], vec![None]);
    assert_eq!(row.get_int("count").unwrap(), 0);
    assert!(row.is_null("count").unwrap());
    assert_eq!(row.get::<i32, _>("count").unwrap(), None);
}

#[test]
fn string_accessor_on_int_column_fails() {
    let row = row(vec![column("id", DataType::Int)], vec![slot(1i32.to_be_bytes())]);
    let err = row.get_string("id").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
}

#[test]
fn type_mismatch_reported_even_when_null() {
    let row = row(vec![column("id", DataType::Int)], vec![None]);
    assert_eq!(row.get_string(0).unwrap_err().kind(), ErrorKind::InvalidType);
    assert_eq!(row.get_double(0).unwrap_err().kind(), ErrorKind::InvalidType);
}

#[test]
fn duplicate_names_resolve_to_first() {
    let row = row(
        vec![
            column("N", DataType::Int),
            column("other", DataType::Text),
            column("n", DataType::Int),
        ],
        vec![slot(1i32.to_be_bytes()), None, slot(2i32.to_be_bytes())],
    );
    assert_eq!(row.column_definitions().index_of("n").unwrap(), 0);
    assert_eq!(row.get_int("n").unwrap(), 1);
    assert_eq!(row.get_int(2).unwrap(), 2);
    assert_eq!(row.get_int("\"n\"").unwrap(), 2);
}

// ════════════════════════════════════════════════════════════════
//  Boundaries
// ════════════════════════════════════════════════════════════════

#[test]
fn out_of_range_and_unknown_names() {
    let row = row(vec![column("id", DataType::Int)], vec![slot(1i32.to_be_bytes())]);
    assert_eq!(
        row.get_int(row.len()).unwrap_err(),
        RowError::IndexOutOfRange { index: 1, len: 1 }
    );
    assert_eq!(row.is_null(usize::MAX).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    assert_eq!(
        row.get_int("nonexistent").unwrap_err(),
        RowError::NameNotFound("nonexistent".into())
    );
}

#[test]
fn slot_count_must_match_columns() {
    let defs = Arc::new(ColumnDefinitions::new(vec![column("id", DataType::Int)], CodecRegistry::new()));
    let err = Row::new(defs, vec![], ProtocolVersion::V4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalState);
}

#[test]
fn malformed_bytes_are_invalid_type() {
    let row = row(vec![column("id", DataType::Int)], vec![slot([1u8, 2, 3])]);
    assert_eq!(row.get_int(0).unwrap_err().kind(), ErrorKind::InvalidType);
    assert_eq!(row.get_bytes_unsafe(0).unwrap(), Some(Bytes::from_static(&[1, 2, 3])));
}

// ════════════════════════════════════════════════════════════════
//  Accessor families
// ════════════════════════════════════════════════════════════════

#[test]
fn null_slots_of_every_family() {
    let types = vec![
        column("b", DataType::Boolean),
        column("t", DataType::TinyInt),
        column("s", DataType::SmallInt),
        column("l", DataType::BigInt),
        column("f", DataType::Float),
        column("d", DataType::Double),
        column("tm", DataType::Time),
        column("txt", DataType::Text),
        column("blob", DataType::Blob),
        column("vi", DataType::Varint),
        column("dec", DataType::Decimal),
        column("u", DataType::Uuid),
        column("ip", DataType::Inet),
        column("ts", DataType::Timestamp),
        column("dt", DataType::Date),
        column("dur", DataType::Duration),
        column("set", DataType::set(DataType::Int)),
        column("map", DataType::map(DataType::Text, DataType::Int)),
        column("tup", DataType::tuple(vec![DataType::Int])),
    ];
    let n = types.len();
    let row = row(types, vec![None; n]);

    assert!(!row.get_bool("b").unwrap());
    assert_eq!(row.get_byte("t").unwrap(), 0);
    assert_eq!(row.get_short("s").unwrap(), 0);
    assert_eq!(row.get_long("l").unwrap(), 0);
    assert_eq!(row.get_float("f").unwrap(), 0.0);
    assert_eq!(row.get_double("d").unwrap(), 0.0);
    assert_eq!(row.get_time("tm").unwrap(), 0);
    assert_eq!(row.get_string("txt").unwrap(), None);
    assert_eq!(row.get_bytes("blob").unwrap(), None);
    assert_eq!(row.get_bytes_unsafe("blob").unwrap(), None);
    assert_eq!(row.get_varint("vi").unwrap(), None);
    assert_eq!(row.get_decimal("dec").unwrap(), None);
    assert_eq!(row.get_uuid("u").unwrap(), None);
    assert_eq!(row.get_inet("ip").unwrap(), None);
    assert_eq!(row.get_timestamp("ts").unwrap(), None);
    assert_eq!(row.get_date("dt").unwrap(), None);
    assert_eq!(row.get_duration("dur").unwrap(), None);
    assert!(row.get_set::<i32, _>("set").unwrap().is_empty());
    assert!(row.get_map::<String, i32, _>("map").unwrap().is_empty());
    assert_eq!(row.get_tuple_value("tup").unwrap(), None);
    assert_eq!(row.get_object("txt").unwrap(), None);
    assert_eq!(row.to_string().matches("NULL").count(), n);
}

#[test]
fn long_and_time_accessors_check_the_wire_type() {
    let row = row(
        vec![column("c", DataType::Counter), column("tm", DataType::Time)],
        vec![slot(7i64.to_be_bytes()), slot(1_000i64.to_be_bytes())],
    );
    assert_eq!(row.get_long("c").unwrap(), 7);
    assert_eq!(row.get_time("tm").unwrap(), 1_000);
    assert_eq!(row.get_long("tm").unwrap_err().kind(), ErrorKind::InvalidType);
    assert_eq!(row.get_time("c").unwrap_err().kind(), ErrorKind::InvalidType);
}

#[test]
fn long_accessor_reads_registered_custom_types() {
    let epoch = DataType::Custom("com.example.EpochMillis".into());
    let registry = CodecRegistry::new();
    let defs = Arc::new(ColumnDefinitions::new(vec![column("at", epoch.clone())], registry.clone()));
    let row = Row::new(defs, vec![slot(1_234i64.to_be_bytes())], ProtocolVersion::V4).unwrap();

    assert_eq!(row.get_long("at").unwrap_err().kind(), ErrorKind::InvalidType);

    registry.register::<i64, _>(strata_row::codec::PrimitiveCodec::<i64>::new(
        epoch,
        true,
        |b| {
            let raw: [u8; 8] = b.try_into().map_err(|_| RowError::invalid_type("expecting 8 bytes"))?;
            Ok(i64::from_be_bytes(raw))
        },
        |v| Ok(v.to_be_bytes().to_vec()),
    ));
    assert_eq!(row.get_long("at").unwrap(), 1_234);
    assert_eq!(row.get::<i64, _>("at").unwrap(), Some(1_234));
    assert_eq!(row.get_time("at").unwrap_err().kind(), ErrorKind::InvalidType);
}

#[test]
fn time_outside_the_day_is_rejected() {
    let row = row(vec![column("tm", DataType::Time)], vec![slot((-5i64).to_be_bytes())]);
    assert_eq!(row.get_time("tm").unwrap_err().kind(), ErrorKind::InvalidType);
    assert_eq!(row.get_object("tm").unwrap_err().kind(), ErrorKind::InvalidType);
    assert_eq!(row.to_string(), "Row[0xfffffffffffffffb]");
}

#[test]
fn collections_decode_into_requested_containers() {
    let registry = CodecRegistry::new();
    let map_type = DataType::map(DataType::Text, DataType::list(DataType::Int));
    let value = HashMap::from([("a".to_string(), vec![1, 2]), ("b".to_string(), vec![])]);
    let raw = encode(&*registry.codec_for::<HashMap<String, Vec<i32>>>(&map_type).unwrap(), &value);
    let row = row(vec![column("m", map_type)], vec![slot(&raw)]);

    assert_eq!(row.get_map::<String, Vec<i32>, _>("m").unwrap(), value);
    let ordered = row.get::<BTreeMap<String, Vec<i32>>, _>("m").unwrap().unwrap();
    assert_eq!(ordered.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(row.get_map::<String, String, _>("m").unwrap_err().kind(), ErrorKind::InvalidType);
}

#[test]
fn sets_and_default_values() {
    let registry = CodecRegistry::new();
    let set_type = DataType::set(DataType::Int);
    let raw = encode(&*registry.codec_for::<HashSet<i32>>(&set_type).unwrap(), &HashSet::from([5]));
    let row = row(vec![column("s", set_type)], vec![slot(&raw)]);
    assert_eq!(row.get_set::<i32, _>("s").unwrap(), HashSet::from([5]));
    assert_eq!(row.get_object("s").unwrap(), Some(Value::Set(vec![Value::Int(5)])));
}

#[test]
fn get_with_checks_acceptance() {
    let row = row(
        vec![column("c", DataType::Counter), column("n", DataType::Int)],
        vec![slot(9i64.to_be_bytes()), slot(1i32.to_be_bytes())],
    );
    assert_eq!(row.get_with::<i64, _>("c", &primitive::counter()).unwrap(), Some(9));
    let err = row.get_with::<i64, _>("n", &primitive::bigint()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidType);
}

#[test]
fn accessors_are_idempotent() {
    let row = row(vec![column("name", DataType::Text)], vec![slot(b"Ada")]);
    let first = row.get_object("name").unwrap();
    let second = row.get_object("name").unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Some(Value::Text("Ada".into())));
}

#[test]
fn positional_and_named_agree() {
    let row = row(
        vec![
            column("a", DataType::Int),
            column("b", DataType::Text),
            column("c", DataType::list(DataType::BigInt)),
        ],
        vec![slot(3i32.to_be_bytes()), None, slot([0u8; 4])],
    );
    for (i, def) in row.column_definitions().iter().enumerate() {
        assert_eq!(row.get_object(i).unwrap(), row.get_object(def.name.as_str()).unwrap());
        assert_eq!(row.is_null(i).unwrap(), row.is_null(&def.name).unwrap());
    }
}

// ════════════════════════════════════════════════════════════════
//  Nested values
// ════════════════════════════════════════════════════════════════

fn address_type() -> Arc<UserType> {
    Arc::new(UserType::new(
        "ks",
        "address",
        vec![
            UdtField::new("street", DataType::Text),
            UdtField::new("zip", DataType::Int),
            UdtField::new("tags", DataType::set(DataType::Text)),
        ],
    ))
}

#[test]
fn udt_column_round_trip() {
    let registry = CodecRegistry::new();
    let mut address = UdtValue::new(address_type(), registry.clone());
    address.set("street", Some(&"1 Main".to_string())).unwrap();
    address.set("zip", Some(&12345i32)).unwrap();
    let raw = address.encode().unwrap();

    let defs = Arc::new(ColumnDefinitions::new(
        vec![column("home", DataType::Udt(address_type()))],
        registry,
    ));
    let row = Row::new(defs, vec![Some(Bytes::from(raw))], ProtocolVersion::V4).unwrap();
    let decoded = row.get_udt_value("home").unwrap().unwrap();
    assert_eq!(decoded, address);
    assert_eq!(decoded.get_string("STREET").unwrap().as_deref(), Some("1 Main"));
    assert_eq!(decoded.get_int("zip").unwrap(), 12345);
    assert!(decoded.get_set::<String, _>("tags").unwrap().is_empty());
    assert_eq!(row.to_string(), "Row[{street: '1 Main', zip: 12345, tags: NULL}]");
}

#[test]
fn udt_with_missing_trailing_fields() {
    let row = row(
        vec![column("home", DataType::Udt(address_type()))],
        vec![slot([0, 0, 0, 1, b'x'])],
    );
    let udt = row.get_udt_value(0).unwrap().unwrap();
    assert_eq!(udt.get_string(0).unwrap().as_deref(), Some("x"));
    assert!(udt.is_null("zip").unwrap());
    assert!(udt.is_null("tags").unwrap());
}

#[test]
fn tuple_in_list() {
    let registry = CodecRegistry::new();
    let tuple_type = DataType::tuple(vec![DataType::Text, DataType::Int]);
    let mut first = TupleValue::new(vec![DataType::Text, DataType::Int], registry.clone());
    first.set(0, Some(&"a".to_string())).unwrap().set(1, Some(&1i32)).unwrap();
    let list_type = DataType::list(tuple_type);
    let raw = encode(&*registry.codec_for::<Vec<TupleValue>>(&list_type).unwrap(), &vec![first.clone()]);

    let row = row(vec![column("pairs", list_type)], vec![slot(&raw)]);
    let pairs = row.get_list::<TupleValue, _>("pairs").unwrap();
    assert_eq!(pairs, vec![first]);
    assert_eq!(pairs[0].get_int(1).unwrap(), 1);
    assert_eq!(row.to_string(), "Row[[('a', 1)]]");
}

#[test]
fn value_json_for_nested_types() {
    let registry = CodecRegistry::new();
    let mut address = UdtValue::new(address_type(), registry.clone());
    address.set("zip", Some(&10i32)).unwrap();
    let value = Value::Udt(address);
    assert_eq!(
        value.to_json().unwrap(),
        serde_json::json!({"street": null, "zip": 10, "tags": null})
    );
}

// ════════════════════════════════════════════════════════════════
//  Tokens
// ════════════════════════════════════════════════════════════════

#[test]
fn partition_key_token() {
    let row = row(
        vec![column("id", DataType::Int), column("system.token(id)", DataType::BigInt)],
        vec![slot(1i32.to_be_bytes()), slot((-77i64).to_be_bytes())],
    )
    .with_partitioner(Partitioner::Murmur3);
    assert_eq!(row.get_partition_key_token().unwrap(), Some(Token::Murmur3(-77)));
    assert_eq!(row.get_token(1).unwrap(), Some(Token::Murmur3(-77)));
    assert_eq!(row.get_token(0).unwrap_err().kind(), ErrorKind::InvalidType);
}

#[test]
fn token_errors() {
    let plain = row(vec![column("id", DataType::Int)], vec![slot(1i32.to_be_bytes())]);
    assert_eq!(plain.get_partition_key_token().unwrap_err().kind(), ErrorKind::IllegalState);

    let no_partitioner = row(vec![column("token(id)", DataType::BigInt)], vec![None]);
    assert_eq!(no_partitioner.get_token(0).unwrap_err().kind(), ErrorKind::IllegalState);

    let random = row(vec![column("token(id)", DataType::BigInt)], vec![None]).with_partitioner(Partitioner::Random);
    assert_eq!(random.get_partition_key_token().unwrap_err().kind(), ErrorKind::InvalidType);
}

// ════════════════════════════════════════════════════════════════
//  Registry interplay
// ════════════════════════════════════════════════════════════════

#[test]
fn custom_type_needs_a_registered_default() {
    let point = DataType::Custom("com.example.Point".into());
    let registry = CodecRegistry::new();
    let defs = Arc::new(ColumnDefinitions::new(vec![column("p", point.clone())], registry.clone()));
    let row = Row::new(defs, vec![Some(Bytes::from_static(&[1, 2]))], ProtocolVersion::V4).unwrap();

    assert_eq!(row.get_bytes("p").unwrap(), Some(Bytes::from_static(&[1, 2])));
    assert_eq!(row.get_object("p").unwrap_err().kind(), ErrorKind::InvalidType);

    registry.register_default(strata_row::codec::MappedCodec::new(
        Arc::new(primitive::custom()) as Arc<dyn TypeCodec<Bytes>>,
        Value::Blob,
        |v| match v {
            Value::Blob(b) => Some(b),
            _ => None,
        },
    ));
    assert_eq!(row.get_object("p").unwrap(), Some(Value::Blob(Bytes::from_static(&[1, 2]))));
}

#[test]
fn rows_are_shareable_across_threads() {
    let row = row(
        vec![column("id", DataType::Int), column("tags", DataType::list(DataType::Text))],
        vec![slot(5i32.to_be_bytes()), slot([0, 0, 0, 1, 0, 0, 0, 1, b'z'])],
    );
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(row.get_int("id").unwrap(), 5);
                    assert_eq!(row.get_list::<String, _>("tags").unwrap(), vec!["z".to_string()]);
                }
            });
        }
    });
}

#[test]
fn registration_while_reading() {
    let registry = CodecRegistry::new();
    let defs = Arc::new(ColumnDefinitions::new(
        vec![column("v", DataType::list(DataType::Int))],
        registry.clone(),
    ));
    let raw = Bytes::from_static(&[0, 0, 0, 1, 0, 0, 0, 4, 0, 0, 0, 3]);
    let row = Row::new(defs, vec![Some(raw)], ProtocolVersion::V4).unwrap();
    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..50 {
                let class = format!("com.example.T{i}");
                registry.register(strata_row::codec::PrimitiveCodec::<i32>::new(
                    DataType::Custom(class),
                    true,
                    |_| Ok(0),
                    |_| Ok(vec![]),
                ));
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    assert_eq!(row.get_list::<i32, _>("v").unwrap(), vec![3]);
                }
            });
        }
    });
}
