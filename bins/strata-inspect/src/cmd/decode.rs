use strata_row::{GettableData, Row};

use crate::cmd::{build_columns, build_rows};
use crate::config::{DecodeArgs, Fixture, OutputFormat};
use crate::error::InspectError;

pub fn run(args: DecodeArgs) -> Result<(), InspectError> {
    let fixture = Fixture::load(&args.fixture)?;
    let columns = build_columns(&fixture)?;
    let rows = build_rows(&fixture, &columns)?;
    let with_token = fixture.partitioner.is_some() && columns.token_column().is_some();

    tracing::info!(
        fixture = %args.fixture,
        columns = %columns,
        rows = rows.len(),
        version = %fixture.protocol_version,
        "decoding rows"
    );

    for row in &rows {
        match args.format {
            OutputFormat::Text => {
                print!("{row}");
                if with_token {
                    match row.get_partition_key_token()? {
                        Some(token) => print!("  token={token}"),
                        None => print!("  token=NULL"),
                    }
                }
                println!();
            }
            OutputFormat::Json => {
                let json = row_to_json(row, with_token)?;
                println!("{}", serde_json::to_string(&json)?);
            }
        }
    }
    Ok(())
}

/// Column name to value; repeated names keep the first column.
fn row_to_json(row: &Row, with_token: bool) -> Result<serde_json::Value, InspectError> {
    let mut object = serde_json::Map::new();
    for (i, column) in row.column_definitions().iter().enumerate() {
        if object.contains_key(&column.name) {
            continue;
        }
        let value = match row.get_object(i)? {
            Some(v) => v.to_json()?,
            None => serde_json::Value::Null,
        };
        object.insert(column.name.clone(), value);
    }
    if with_token {
        let token = row.get_partition_key_token()?;
        object.insert(
            "$token".to_string(),
            token.map_or(serde_json::Value::Null, |t| serde_json::Value::String(t.to_string())),
        );
    }
    Ok(serde_json::Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Fixture;

    #[test]
    fn json_object_per_row() {
        let fixture = Fixture::parse(
            r#"
            partitioner = "Murmur3Partitioner"

            [[columns]]
            name = "id"
            type = "int"

            [[columns]]
            name = "tags"
            type = "list<text>"

            [[columns]]
            name = "token(id)"
            type = "bigint"

            [[rows]]
            values = ["00000007", "null", "ffffffffffffffff"]
            "#,
        )
        .unwrap();
        let columns = build_columns(&fixture).unwrap();
        let rows = build_rows(&fixture, &columns).unwrap();
        let json = row_to_json(&rows[0], true).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json["tags"].is_null());
        assert_eq!(json["token(id)"], -1);
        assert_eq!(json["$token"], "-1");
    }
}
