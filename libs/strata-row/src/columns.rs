use std::collections::HashMap;
use std::fmt;

use strata_api::data_type::unquote;
use strata_api::{DataType, RowError};

use crate::registry::CodecRegistry;

/// One column of a result: where it comes from, its name and wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub keyspace: String,
    pub table: String,
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDefinition {
    pub fn new(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column metadata of a result, shared by all its rows.
///
/// Name lookups are case-insensitive unless the name is double-quoted.
/// Duplicate names are allowed; lookups return the first match.
#[derive(Debug, Clone)]
pub struct ColumnDefinitions {
    columns: Vec<ColumnDefinition>,
    /// Lowercased name to every position carrying it, ascending.
    by_name: HashMap<String, Vec<usize>>,
    registry: CodecRegistry,
}

impl ColumnDefinitions {
    pub fn new(columns: Vec<ColumnDefinition>, registry: CodecRegistry) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, column) in columns.iter().enumerate() {
            by_name.entry(column.name.to_lowercase()).or_default().push(i);
        }
        Self {
            columns,
            by_name,
            registry,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.indices_of(name).is_empty()
    }

    /// Every position whose column matches `name`, in ascending order.
    pub fn indices_of(&self, name: &str) -> Vec<usize> {
        match unquote(name) {
            Some(exact) => self
                .by_name
                .get(&exact.to_lowercase())
                .map(|positions| {
                    positions
                        .iter()
                        .copied()
                        .filter(|i| self.columns[*i].name == exact)
                        .collect()
                })
                .unwrap_or_default(),
            None => self.by_name.get(&name.to_lowercase()).cloned().unwrap_or_default(),
        }
    }

    /// Position of the first column matching `name`.
    pub fn index_of(&self, name: &str) -> Result<usize, RowError> {
        self.indices_of(name)
            .first()
            .copied()
            .ok_or_else(|| RowError::NameNotFound(name.to_owned()))
    }

    pub fn get(&self, index: usize) -> Result<&ColumnDefinition, RowError> {
        self.columns.get(index).ok_or(RowError::IndexOutOfRange {
            index,
            len: self.columns.len(),
        })
    }

    pub fn name(&self, index: usize) -> Result<&str, RowError> {
        self.get(index).map(|c| c.name.as_str())
    }

    pub fn keyspace(&self, index: usize) -> Result<&str, RowError> {
        self.get(index).map(|c| c.keyspace.as_str())
    }

    pub fn table(&self, index: usize) -> Result<&str, RowError> {
        self.get(index).map(|c| c.table.as_str())
    }

    pub fn data_type(&self, index: usize) -> Result<&DataType, RowError> {
        self.get(index).map(|c| &c.data_type)
    }

    /// Position of the first `token(...)` or `system.token(...)` column.
    pub fn token_column(&self) -> Option<usize> {
        self.columns.iter().position(|c| is_token_column(&c.name))
    }

    pub(crate) fn data_type_unchecked(&self, index: usize) -> &DataType {
        &self.columns[index].data_type
    }
}

fn is_token_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    let call = lower.strip_prefix("system.").unwrap_or(&lower);
    call.starts_with("token(") && call.ends_with(')')
}

impl<'a> IntoIterator for &'a ColumnDefinitions {
    type Item = &'a ColumnDefinition;
    type IntoIter = std::slice::Iter<'a, ColumnDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl fmt::Display for ColumnDefinitions {
    /// `Columns[id(int), name(text)]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Columns[")?;
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}({})", c.name, c.data_type)?;
        }
        f.write_str("]")
    }
}
