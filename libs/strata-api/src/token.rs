use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::error::RowError;

/// Position of a partition on the ring.
///
/// Tokens of the same partitioner compare in ring order. The value carries
/// no reference to the partitioner that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    Murmur3(i64),
    Random(BigInt),
    ByteOrdered(Vec<u8>),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Murmur3(v) => write!(f, "{v}"),
            Token::Random(v) => write!(f, "{v}"),
            Token::ByteOrdered(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

/// Partitioner configured on the cluster. Decides which wire type token
/// columns have and how their bytes are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Partitioner {
    Murmur3,
    Random,
    ByteOrdered,
}

impl Partitioner {
    /// Match a server-side partitioner class name
    /// (e.g. `org.apache.cassandra.dht.Murmur3Partitioner`).
    pub fn from_class_name(name: &str) -> Option<Self> {
        if name.ends_with("Murmur3Partitioner") {
            Some(Partitioner::Murmur3)
        } else if name.ends_with("RandomPartitioner") {
            Some(Partitioner::Random)
        } else if name.ends_with("OrderedPartitioner") {
            Some(Partitioner::ByteOrdered)
        } else {
            None
        }
    }

    /// Wire type of `token(...)` columns under this partitioner.
    pub fn token_type(&self) -> DataType {
        match self {
            Partitioner::Murmur3 => DataType::BigInt,
            Partitioner::Random => DataType::Varint,
            Partitioner::ByteOrdered => DataType::Blob,
        }
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Token, RowError> {
        match self {
            Partitioner::Murmur3 => {
                let raw: [u8; 8] = bytes.try_into().map_err(|_| {
                    RowError::invalid_type(format!(
                        "invalid Murmur3 token, expecting 8 bytes but got {}",
                        bytes.len()
                    ))
                })?;
                Ok(Token::Murmur3(i64::from_be_bytes(raw)))
            }
            Partitioner::Random => Ok(Token::Random(BigInt::from_signed_bytes_be(bytes))),
            Partitioner::ByteOrdered => Ok(Token::ByteOrdered(bytes.to_vec())),
        }
    }

    pub fn serialize(&self, token: &Token) -> Result<Vec<u8>, RowError> {
        match (self, token) {
            (Partitioner::Murmur3, Token::Murmur3(v)) => Ok(v.to_be_bytes().to_vec()),
            (Partitioner::Random, Token::Random(v)) => Ok(v.to_signed_bytes_be()),
            (Partitioner::ByteOrdered, Token::ByteOrdered(v)) => Ok(v.clone()),
            (p, t) => Err(RowError::invalid_type(format!("token {t} was not produced by the {p} partitioner"))),
        }
    }

    /// Parse the textual form of a token (as printed by `Display`).
    pub fn parse_token(&self, s: &str) -> Result<Token, RowError> {
        let invalid = |e: &dyn fmt::Display| RowError::invalid_type(format!("cannot parse {self} token '{s}': {e}"));
        match self {
            Partitioner::Murmur3 => s.parse::<i64>().map(Token::Murmur3).map_err(|e| invalid(&e)),
            Partitioner::Random => s.parse::<BigInt>().map(Token::Random).map_err(|e| invalid(&e)),
            Partitioner::ByteOrdered => {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                hex::decode(digits).map(Token::ByteOrdered).map_err(|e| invalid(&e))
            }
        }
    }
}

impl fmt::Display for Partitioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partitioner::Murmur3 => f.write_str("murmur3"),
            Partitioner::Random => f.write_str("random"),
            Partitioner::ByteOrdered => f.write_str("byte_ordered"),
        }
    }
}

impl FromStr for Partitioner {
    type Err = String;

    /// Short names (`murmur3`, `random`, `byte_ordered`) or class names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "murmur3" => Ok(Partitioner::Murmur3),
            "random" => Ok(Partitioner::Random),
            "byte_ordered" => Ok(Partitioner::ByteOrdered),
            other => Partitioner::from_class_name(other).ok_or_else(|| format!("unknown partitioner '{other}'")),
        }
    }
}

impl TryFrom<String> for Partitioner {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
