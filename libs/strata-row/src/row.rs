use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use strata_api::{DataType, Partitioner, ProtocolVersion, RowError, Token};

use crate::columns::ColumnDefinitions;
use crate::gettable::{ColumnIndex, GettableData};
use crate::registry::CodecRegistry;

/// One row of a query result.
///
/// Column metadata is shared with every other row of the same result; the
/// row itself only owns its serialized values, one per column, `None`
/// for null. Values are decoded on each access and never cached, so a
/// row can be read from several threads at once.
#[derive(Clone)]
pub struct Row {
    columns: Arc<ColumnDefinitions>,
    values: Vec<Option<Bytes>>,
    version: ProtocolVersion,
    partitioner: Option<Partitioner>,
}

impl Row {
    /// Fails with `IllegalState` unless there is exactly one value per
    /// column.
    pub fn new(
        columns: Arc<ColumnDefinitions>,
        values: Vec<Option<Bytes>>,
        version: ProtocolVersion,
    ) -> Result<Self, RowError> {
        if values.len() != columns.len() {
            return Err(RowError::illegal_state(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self {
            columns,
            values,
            version,
            partitioner: None,
        })
    }

    /// Partitioner used to read `token(...)` columns.
    pub fn with_partitioner(mut self, partitioner: Partitioner) -> Self {
        self.partitioner = Some(partitioner);
        self
    }

    pub fn column_definitions(&self) -> &Arc<ColumnDefinitions> {
        &self.columns
    }

    /// Read a token column with the cluster's partitioner.
    ///
    /// `IllegalState` if the row has no partitioner, `InvalidType` if the
    /// column's wire type is not the partitioner's token type.
    pub fn get_token<I: ColumnIndex>(&self, index: I) -> Result<Option<Token>, RowError> {
        let i = index.position(self)?;
        let partitioner = self
            .partitioner
            .ok_or_else(|| RowError::illegal_state("token metadata is not available for this row"))?;
        let expected = partitioner.token_type();
        let actual = self.data_type_at(i);
        if *actual != expected {
            return Err(RowError::invalid_type(format!(
                "column {i} is {actual}, {partitioner} tokens are {expected}"
            )));
        }
        match self.raw_at(i) {
            Some(raw) if !raw.is_empty() => partitioner.deserialize(raw).map(Some),
            _ => Ok(None),
        }
    }

    /// Token of the first column named `token(...)`, the column produced
    /// by selecting `token(<partition key>)`.
    pub fn get_partition_key_token(&self) -> Result<Option<Token>, RowError> {
        let i = self
            .columns
            .token_column()
            .ok_or_else(|| RowError::illegal_state("row has no token(...) column"))?;
        self.get_token(i)
    }
}

impl GettableData for Row {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn index_of(&self, name: &str) -> Result<usize, RowError> {
        self.columns.index_of(name)
    }

    fn data_type_at(&self, index: usize) -> &DataType {
        self.columns.data_type_unchecked(index)
    }

    fn raw_at(&self, index: usize) -> Option<&Bytes> {
        self.values[index].as_ref()
    }

    fn registry(&self) -> &CodecRegistry {
        self.columns.registry()
    }

    fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("columns", &self.columns.to_string())
            .field("values", &self.values)
            .field("version", &self.version)
            .field("partitioner", &self.partitioner)
            .finish()
    }
}

impl fmt::Display for Row {
    /// `Row[1, 'Ada', NULL]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Row[")?;
        for i in 0..self.len() {
            if i > 0 {
                f.write_str(", ")?;
            }
            crate::value::fmt_slot(self, i, f)?;
        }
        f.write_str("]")
    }
}
