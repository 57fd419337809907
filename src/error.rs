use std::fmt;

use crate::parser::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Parse(ParseError),
    InvalidPublicKey(String),
    DuplicateSymbol(String),
    DuplicatePublicKey(String),
    Codec(String),
    InvalidDate(String),
    OutOfOrderBlock { expected: usize, found: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) =>
                write!(f, "parse error: {}", e),
            Error::InvalidPublicKey(reason) =>
                write!(f, "invalid public key: {}", reason),
            Error::DuplicateSymbol(s) =>
                write!(f, "symbol already present in table: {:?}", s),
            Error::DuplicatePublicKey(key) =>
                write!(f, "public key already present in table: {}", key),
            Error::Codec(reason) =>
                write!(f, "block encoding failed: {}", reason),
            Error::InvalidDate(date) =>
                write!(f, "date {} is before the unix epoch", date),
            Error::OutOfOrderBlock { expected, found } =>
                write!(f, "block was drafted at index {} but the chain expects {}", found, expected),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Codec(e.to_string())
    }
}
