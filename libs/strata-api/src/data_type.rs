use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ════════════════════════════════════════════════════════════════
//  Kind
// ════════════════════════════════════════════════════════════════

/// Structural tag of a [`DataType`], without its parameters.
///
/// Codec registries key their tables by kind: every `list<...>` shares
/// the `List` bucket whatever its element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Int,
    Timestamp,
    Uuid,
    Text,
    Varint,
    TimeUuid,
    Inet,
    Date,
    Time,
    SmallInt,
    TinyInt,
    Duration,
    Custom,
    List,
    Set,
    Map,
    Tuple,
    Udt,
}

// ════════════════════════════════════════════════════════════════
//  DataType
// ════════════════════════════════════════════════════════════════

/// Declared on-wire type of a column, a UDT field or a tuple component.
///
/// Composite variants nest recursively. Equality and hashing are
/// structural, so two independently built `map<text, list<int>>`
/// descriptors are interchangeable as registry keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Int,
    /// Milliseconds since the Unix epoch.
    Timestamp,
    Uuid,
    /// UTF-8 text. `varchar` is an alias.
    Text,
    Varint,
    TimeUuid,
    Inet,
    /// Days since the Unix epoch, shifted by 2^31 on the wire.
    Date,
    /// Nanoseconds since midnight.
    Time,
    SmallInt,
    TinyInt,
    Duration,
    /// Server-side custom type, identified by its class name.
    Custom(String),
    List(Box<DataType>),
    Set(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Tuple(Vec<DataType>),
    Udt(Arc<UserType>),
}

impl DataType {
    pub fn list(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }

    pub fn set(element: DataType) -> Self {
        DataType::Set(Box::new(element))
    }

    pub fn map(key: DataType, value: DataType) -> Self {
        DataType::Map(Box::new(key), Box::new(value))
    }

    pub fn tuple(components: Vec<DataType>) -> Self {
        DataType::Tuple(components)
    }

    pub fn udt(user_type: UserType) -> Self {
        DataType::Udt(Arc::new(user_type))
    }

    pub fn kind(&self) -> Kind {
        match self {
            DataType::Ascii => Kind::Ascii,
            DataType::BigInt => Kind::BigInt,
            DataType::Blob => Kind::Blob,
            DataType::Boolean => Kind::Boolean,
            DataType::Counter => Kind::Counter,
            DataType::Decimal => Kind::Decimal,
            DataType::Double => Kind::Double,
            DataType::Float => Kind::Float,
            DataType::Int => Kind::Int,
            DataType::Timestamp => Kind::Timestamp,
            DataType::Uuid => Kind::Uuid,
            DataType::Text => Kind::Text,
            DataType::Varint => Kind::Varint,
            DataType::TimeUuid => Kind::TimeUuid,
            DataType::Inet => Kind::Inet,
            DataType::Date => Kind::Date,
            DataType::Time => Kind::Time,
            DataType::SmallInt => Kind::SmallInt,
            DataType::TinyInt => Kind::TinyInt,
            DataType::Duration => Kind::Duration,
            DataType::Custom(_) => Kind::Custom,
            DataType::List(_) => Kind::List,
            DataType::Set(_) => Kind::Set,
            DataType::Map(..) => Kind::Map,
            DataType::Tuple(_) => Kind::Tuple,
            DataType::Udt(_) => Kind::Udt,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, DataType::List(_) | DataType::Set(_) | DataType::Map(..))
    }

    /// Collections, tuples and user types.
    pub fn is_composite(&self) -> bool {
        self.is_collection() || matches!(self, DataType::Tuple(_) | DataType::Udt(_))
    }

    /// Parse a CQL type string, resolving bare identifiers that are not
    /// built-in type names (user types) through `resolve`.
    pub fn parse_with<F>(input: &str, resolve: F) -> Result<DataType, ParseTypeError>
    where
        F: Fn(&str) -> Option<DataType>,
    {
        let mut parser = TypeParser { input, pos: 0, resolve };
        let data_type = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(data_type)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Ascii => write!(f, "ascii"),
            DataType::BigInt => write!(f, "bigint"),
            DataType::Blob => write!(f, "blob"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Counter => write!(f, "counter"),
            DataType::Decimal => write!(f, "decimal"),
            DataType::Double => write!(f, "double"),
            DataType::Float => write!(f, "float"),
            DataType::Int => write!(f, "int"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Uuid => write!(f, "uuid"),
            DataType::Text => write!(f, "text"),
            DataType::Varint => write!(f, "varint"),
            DataType::TimeUuid => write!(f, "timeuuid"),
            DataType::Inet => write!(f, "inet"),
            DataType::Date => write!(f, "date"),
            DataType::Time => write!(f, "time"),
            DataType::SmallInt => write!(f, "smallint"),
            DataType::TinyInt => write!(f, "tinyint"),
            DataType::Duration => write!(f, "duration"),
            DataType::Custom(class) => write!(f, "'{class}'"),
            DataType::List(e) => write!(f, "list<{e}>"),
            DataType::Set(e) => write!(f, "set<{e}>"),
            DataType::Map(k, v) => write!(f, "map<{k}, {v}>"),
            DataType::Tuple(components) => {
                f.write_str("tuple<")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(">")
            }
            DataType::Udt(ut) => write!(f, "{}.{}", ut.keyspace, ut.name),
        }
    }
}

impl FromStr for DataType {
    type Err = ParseTypeError;

    /// Built-in types only; see [`DataType::parse_with`] for user types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::parse_with(s, |_| None)
    }
}

// ════════════════════════════════════════════════════════════════
//  User types
// ════════════════════════════════════════════════════════════════

/// A single named field of a user-defined type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdtField {
    pub name: String,
    pub data_type: DataType,
}

impl UdtField {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Definition of a user-defined type: ordered named fields.
///
/// Field position determines the slot index in a `UdtValue`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserType {
    pub keyspace: String,
    pub name: String,
    pub fields: Vec<UdtField>,
}

impl UserType {
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>, fields: Vec<UdtField>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            fields,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&UdtField> {
        self.fields.get(index)
    }

    /// Position of the first field matching `name` (see [`identifier_matches`]).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| identifier_matches(name, &f.name))
    }
}

/// Whether a caller-supplied identifier designates `actual`.
///
/// A double-quoted identifier matches case-sensitively, anything else
/// case-insensitively.
pub fn identifier_matches(requested: &str, actual: &str) -> bool {
    match unquote(requested) {
        Some(exact) => exact == actual,
        None => requested.to_lowercase() == actual.to_lowercase(),
    }
}

/// Strip surrounding double quotes, unescaping `""`. `None` if unquoted.
pub fn unquote(identifier: &str) -> Option<String> {
    let inner = identifier.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.replace("\"\"", "\""))
}

// ════════════════════════════════════════════════════════════════
//  Type string parser
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse type at offset {offset}: {message}")]
pub struct ParseTypeError {
    pub offset: usize,
    pub message: String,
}

struct TypeParser<'a, F> {
    input: &'a str,
    pos: usize,
    resolve: F,
}

impl<F> TypeParser<'_, F>
where
    F: Fn(&str) -> Option<DataType>,
{
    fn error(&self, message: impl Into<String>) -> ParseTypeError {
        ParseTypeError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<&str, ParseTypeError> {
        self.skip_ws();
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.input[start..start + len])
    }

    fn parse_type(&mut self) -> Result<DataType, ParseTypeError> {
        if self.eat('\'') {
            let rest = &self.input[self.pos..];
            let end = rest.find('\'').ok_or_else(|| self.error("unterminated custom type"))?;
            let class = rest[..end].to_string();
            self.pos += end + 1;
            return Ok(DataType::Custom(class));
        }

        let name = self.identifier()?.to_string();
        let mut params = Vec::new();
        if self.eat('<') {
            loop {
                params.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }

        let lower = name.to_ascii_lowercase();
        match (lower.as_str(), params.len()) {
            ("list", 1) => Ok(DataType::List(Box::new(params.remove(0)))),
            ("set", 1) => Ok(DataType::Set(Box::new(params.remove(0)))),
            ("map", 2) => {
                let value = params.remove(1);
                let key = params.remove(0);
                Ok(DataType::map(key, value))
            }
            ("tuple", n) if n > 0 => Ok(DataType::Tuple(params)),
            ("frozen", 1) => Ok(params.remove(0)),
            ("list" | "set" | "map" | "tuple" | "frozen", n) => {
                Err(self.error(format!("'{lower}' does not take {n} type parameter(s)")))
            }
            (_, 0) => primitive(&lower)
                .or_else(|| (self.resolve)(&name))
                .ok_or_else(|| self.error(format!("unknown type '{name}'"))),
            (_, _) => Err(self.error(format!("'{name}' does not take type parameters"))),
        }
    }
}

fn primitive(name: &str) -> Option<DataType> {
    let data_type = match name {
        "ascii" => DataType::Ascii,
        "bigint" => DataType::BigInt,
        "blob" => DataType::Blob,
        "boolean" => DataType::Boolean,
        "counter" => DataType::Counter,
        "decimal" => DataType::Decimal,
        "double" => DataType::Double,
        "float" => DataType::Float,
        "int" => DataType::Int,
        "timestamp" => DataType::Timestamp,
        "uuid" => DataType::Uuid,
        "text" | "varchar" => DataType::Text,
        "varint" => DataType::Varint,
        "timeuuid" => DataType::TimeUuid,
        "inet" => DataType::Inet,
        "date" => DataType::Date,
        "time" => DataType::Time,
        "smallint" => DataType::SmallInt,
        "tinyint" => DataType::TinyInt,
        "duration" => DataType::Duration,
        _ => return None,
    };
    Some(data_type)
}
