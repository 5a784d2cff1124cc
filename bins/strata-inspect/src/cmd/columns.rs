use crate::cmd::build_columns;
use crate::config::{ColumnsArgs, Fixture};
use crate::error::InspectError;

pub fn run(args: ColumnsArgs) -> Result<(), InspectError> {
    let fixture = Fixture::load(&args.fixture)?;
    let columns = build_columns(&fixture)?;
    tracing::info!(fixture = %args.fixture, columns = columns.len(), "column definitions loaded");

    for (i, c) in columns.iter().enumerate() {
        println!("{i:>3}  {}.{}.{}  {}", c.keyspace, c.table, c.name, c.data_type);
    }
    Ok(())
}
