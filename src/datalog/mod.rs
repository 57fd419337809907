//! Interned Datalog vocabulary carried by finalized blocks
//!
//! Every string in these types has been replaced by a symbol id, every variable
//! name by a (truncated) symbol id and every public key by its index in the
//! key table. Values are only meaningful next to the `SymbolTable` that
//! produced them.

pub mod symbol;
pub mod expression;
pub mod print;

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

pub use symbol::SymbolTable;
pub use expression::{Binary, Expression, Op, Unary};

pub type SymbolIndex = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// Variable names share the string id space
    Variable(SymbolIndex),
    Integer(i64),
    Str(SymbolIndex),
    Date(u64),
    Bytes(Vec<u8>),
    Bool(bool),
    Set(BTreeSet<Term>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    pub name: SymbolIndex,
    pub terms: Vec<Term>,
}

impl Predicate {
    pub fn new(name: SymbolIndex, terms: Vec<Term>) -> Self {
        Self { name, terms }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Authority,
    Previous,
    /// Index into the token's public key table
    PublicKey(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub head: Predicate,
    pub body: Vec<Predicate>,
    pub expressions: Vec<Expression>,
    pub scopes: Vec<Scope>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckKind {
    /// At least one query must match
    One,
    /// Every match of the query must satisfy its expressions
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Check {
    pub kind: CheckKind,
    pub queries: Vec<Rule>,
}
