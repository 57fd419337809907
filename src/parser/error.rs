use std::fmt;

use crate::constants::MAX_NESTING_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    Expected(&'static str),
    UnexpectedEnd(&'static str),
    InvalidInteger,
    InvalidDate,
    InvalidHex,
    InvalidPublicKey(String),
    VariableInFact(String),
    UnboundHeadVariable(String),
    UnknownMethod(String),
    TrailingInput,
    TooDeep,
}

/// Failure to read datalog text. `position` is a byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::Expected(what) =>
                write!(f, "expected {}", what),
            ParseErrorKind::UnexpectedEnd(what) =>
                write!(f, "unexpected end of input, expected {}", what),
            ParseErrorKind::InvalidInteger =>
                write!(f, "invalid integer"),
            ParseErrorKind::InvalidDate =>
                write!(f, "invalid date, expected YYYY-MM-DDTHH:MM:SSZ"),
            ParseErrorKind::InvalidHex =>
                write!(f, "invalid hex bytes"),
            ParseErrorKind::InvalidPublicKey(reason) =>
                write!(f, "invalid public key: {}", reason),
            ParseErrorKind::VariableInFact(name) =>
                write!(f, "variable ${} not allowed in a fact", name),
            ParseErrorKind::UnboundHeadVariable(name) =>
                write!(f, "head variable ${} does not appear in the rule body", name),
            ParseErrorKind::UnknownMethod(name) =>
                write!(f, "unknown method .{}()", name),
            ParseErrorKind::TrailingInput =>
                write!(f, "unexpected trailing input"),
            ParseErrorKind::TooDeep =>
                write!(f, "nesting deeper than {} levels", MAX_NESTING_DEPTH),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.position)
    }
}

impl std::error::Error for ParseError {}
