pub mod columns;
pub mod decode;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, UdtField, UserType};
use strata_row::{CodecRegistry, ColumnDefinition, ColumnDefinitions, Row};

use crate::config::Fixture;
use crate::error::InspectError;

/// Parse a type string, resolving user types declared so far by `name` or
/// `keyspace.name`.
fn parse_type(input: &str, owner: &str, types: &HashMap<String, DataType>) -> Result<DataType, InspectError> {
    DataType::parse_with(input, |name| types.get(&name.to_lowercase()).cloned()).map_err(|source| {
        InspectError::Type {
            owner: owner.to_string(),
            source,
        }
    })
}

fn build_user_types(fixture: &Fixture) -> Result<HashMap<String, DataType>, InspectError> {
    let mut types = HashMap::new();
    for t in &fixture.types {
        let keyspace = t.keyspace.as_deref().unwrap_or(&fixture.keyspace);
        let mut fields = Vec::with_capacity(t.fields.len());
        for field in &t.fields {
            let owner = format!("{}.{}", t.name, field.name);
            fields.push(UdtField::new(&field.name, parse_type(&field.data_type, &owner, &types)?));
        }
        let data_type = DataType::udt(UserType::new(keyspace, &t.name, fields));
        tracing::debug!(keyspace, name = %t.name, "user type declared");
        types.insert(t.name.to_lowercase(), data_type.clone());
        types.insert(format!("{keyspace}.{}", t.name).to_lowercase(), data_type);
    }
    Ok(types)
}

pub fn build_columns(fixture: &Fixture) -> Result<Arc<ColumnDefinitions>, InspectError> {
    let types = build_user_types(fixture)?;
    let columns = fixture
        .columns
        .iter()
        .map(|c| {
            let data_type = parse_type(&c.data_type, &c.name, &types)?;
            Ok(ColumnDefinition::new(
                c.keyspace.as_deref().unwrap_or(&fixture.keyspace),
                c.table.as_deref().unwrap_or(&fixture.table),
                &c.name,
                data_type,
            ))
        })
        .collect::<Result<Vec<_>, InspectError>>()?;
    Ok(Arc::new(ColumnDefinitions::new(columns, CodecRegistry::default_instance())))
}

fn parse_slot(raw: &str, row: usize, index: usize) -> Result<Option<Bytes>, InspectError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits)
        .map(|b| Some(Bytes::from(b)))
        .map_err(|e| InspectError::Value {
            row,
            index,
            detail: e.to_string(),
        })
}

pub fn build_rows(fixture: &Fixture, columns: &Arc<ColumnDefinitions>) -> Result<Vec<Row>, InspectError> {
    fixture
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let values = row
                .values
                .iter()
                .enumerate()
                .map(|(i, raw)| parse_slot(raw, r, i))
                .collect::<Result<Vec<_>, _>>()?;
            let built = Row::new(Arc::clone(columns), values, fixture.protocol_version)
                .map_err(|e| e.with_context(format_args!("row {r}")))?;
            Ok(match fixture.partitioner {
                Some(p) => built.with_partitioner(p),
                None => built,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_api::{ErrorKind, Kind};
    use strata_row::GettableData;

    const FIXTURE: &str = r#"
        keyspace = "shop"
        table = "customers"

        [[types]]
        name = "address"
        fields = [
            { name = "street", type = "text" },
            { name = "zip", type = "int" },
        ]

        [[types]]
        name = "contact"
        fields = [{ name = "home", type = "frozen<shop.address>" }]

        [[columns]]
        name = "id"
        type = "int"

        [[columns]]
        name = "contact"
        type = "frozen<contact>"

        [[rows]]
        values = ["0000002a", "null"]
    "#;

    #[test]
    fn user_types_resolve_by_short_and_qualified_name() {
        let fixture = Fixture::parse(FIXTURE).unwrap();
        let columns = build_columns(&fixture).unwrap();
        assert_eq!(columns.keyspace(1).unwrap(), "shop");
        assert_eq!(columns.table(0).unwrap(), "customers");
        let DataType::Udt(contact) = columns.data_type(1).unwrap() else {
            panic!("contact should be a user type");
        };
        assert_eq!(contact.fields[0].data_type.kind(), Kind::Udt);
    }

    #[test]
    fn rows_decode() {
        let fixture = Fixture::parse(FIXTURE).unwrap();
        let columns = build_columns(&fixture).unwrap();
        let rows = build_rows(&fixture, &columns).unwrap();
        assert_eq!(rows[0].get_int("id").unwrap(), 42);
        assert!(rows[0].is_null("contact").unwrap());
    }

    #[test]
    fn unknown_type_names_the_column() {
        let fixture = Fixture::parse("[[columns]]\nname = \"x\"\ntype = \"frozen<nope>\"").unwrap();
        let err = build_columns(&fixture).unwrap_err();
        assert!(matches!(err, InspectError::Type { ref owner, .. } if owner == "x"));
    }

    #[test]
    fn wrong_value_count() {
        let fixture = Fixture::parse("[[columns]]\nname = \"x\"\ntype = \"int\"\n[[rows]]\nvalues = []").unwrap();
        let columns = build_columns(&fixture).unwrap();
        match build_rows(&fixture, &columns).unwrap_err() {
            InspectError::Row(e) => assert_eq!(e.kind(), ErrorKind::IllegalState),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_hex() {
        let fixture = Fixture::parse("[[columns]]\nname = \"x\"\ntype = \"int\"\n[[rows]]\nvalues = [\"zz\"]").unwrap();
        let columns = build_columns(&fixture).unwrap();
        assert!(matches!(
            build_rows(&fixture, &columns).unwrap_err(),
            InspectError::Value { row: 0, index: 0, .. }
        ));
    }

    #[test]
    fn sample_fixture() {
        let fixture = Fixture::load(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample.toml")).unwrap();
        let columns = build_columns(&fixture).unwrap();
        let rows = build_rows(&fixture, &columns).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.get_string("name").unwrap().as_deref(), Some("Ada"));
        assert_eq!(first.get_list::<String, _>("tags").unwrap(), vec!["a", "bc"]);
        let home = first.get_udt_value("home").unwrap().unwrap();
        assert_eq!(home.get_int("zip").unwrap(), 12345);
        assert_eq!(
            first.get_partition_key_token().unwrap(),
            Some(strata_api::Token::Murmur3(-4069959284402364209))
        );

        let second = &rows[1];
        assert!(second.get_list::<String, _>("tags").unwrap().is_empty());
        assert!(!second.is_null("tags").unwrap());
        assert_eq!(second.get_udt_value("home").unwrap(), None);
    }
}
