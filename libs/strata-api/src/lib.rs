pub mod data_type;
pub mod error;
pub mod protocol;
pub mod temporal;
pub mod token;

pub use data_type::{DataType, Kind, ParseTypeError, UdtField, UserType, identifier_matches};
pub use error::{ErrorKind, RowError};
pub use protocol::ProtocolVersion;
pub use temporal::{Duration, LocalDate, Timestamp};
pub use token::{Partitioner, Token};
