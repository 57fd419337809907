//! User-facing Datalog vocabulary
//!
//! These types carry plain strings and keys. `convert` interns them into a
//! `SymbolTable` and yields the `datalog` equivalents stored in blocks.

pub mod block;
pub mod policy;

use std::collections::BTreeSet;
use chrono::{DateTime, Utc};

use crate::datalog::{self, SymbolTable};
use crate::error::Error;
use crate::keys::PublicKey;
use crate::utils::time::unix_seconds;

pub use crate::datalog::{Binary, CheckKind, Unary};
pub use block::BlockBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Variable(String),
    Integer(i64),
    Str(String),
    Date(u64),
    Bytes(Vec<u8>),
    Bool(bool),
    Set(BTreeSet<Term>),
}

impl Term {
    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Term {
        match self {
            Term::Variable(name) => datalog::Term::Variable(symbols.insert(name)),
            Term::Integer(i) => datalog::Term::Integer(*i),
            Term::Str(s) => datalog::Term::Str(symbols.insert(s)),
            Term::Date(d) => datalog::Term::Date(*d),
            Term::Bytes(b) => datalog::Term::Bytes(b.clone()),
            Term::Bool(b) => datalog::Term::Bool(*b),
            Term::Set(set) => datalog::Term::Set(set.iter().map(|t| t.convert(symbols)).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub name: String,
    pub terms: Vec<Term>,
}

impl Predicate {
    pub fn new(name: impl Into<String>, terms: Vec<Term>) -> Self {
        Self { name: name.into(), terms }
    }

    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Predicate {
        let name = symbols.insert(&self.name);
        let terms = self.terms.iter().map(|t| t.convert(symbols)).collect();
        datalog::Predicate::new(name, terms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fact {
    pub predicate: Predicate,
}

impl Fact {
    pub fn new(name: impl Into<String>, terms: Vec<Term>) -> Self {
        Self { predicate: Predicate::new(name, terms) }
    }

    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Fact {
        datalog::Fact { predicate: self.predicate.convert(symbols) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    Value(Term),
    Unary(Unary),
    Binary(Binary),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    pub ops: Vec<Op>,
}

impl Expression {
    /// `left <op> right` as a three-instruction program.
    pub fn binary(op: Binary, left: Term, right: Term) -> Self {
        Self { ops: vec![Op::Value(left), Op::Value(right), Op::Binary(op)] }
    }

    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Expression {
        let ops = self
            .ops
            .iter()
            .map(|op| match op {
                Op::Value(t) => datalog::Op::Value(t.convert(symbols)),
                Op::Unary(u) => datalog::Op::Unary(*u),
                Op::Binary(b) => datalog::Op::Binary(*b),
            })
            .collect();
        datalog::Expression { ops }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Authority,
    Previous,
    PublicKey(PublicKey),
}

impl Scope {
    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Scope {
        match self {
            Scope::Authority => datalog::Scope::Authority,
            Scope::Previous => datalog::Scope::Previous,
            Scope::PublicKey(key) => datalog::Scope::PublicKey(symbols.insert_public_key(key)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: Predicate,
    pub body: Vec<Predicate>,
    pub expressions: Vec<Expression>,
    pub scopes: Vec<Scope>,
}

impl Rule {
    pub fn new(head: Predicate, body: Vec<Predicate>, expressions: Vec<Expression>, scopes: Vec<Scope>) -> Self {
        Self { head, body, expressions, scopes }
    }

    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Rule {
        let head = self.head.convert(symbols);
        let body = self.body.iter().map(|p| p.convert(symbols)).collect();
        let expressions = self.expressions.iter().map(|e| e.convert(symbols)).collect();
        let scopes = self.scopes.iter().map(|s| s.convert(symbols)).collect();
        datalog::Rule { head, body, expressions, scopes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Check {
    pub kind: CheckKind,
    pub queries: Vec<Rule>,
}

impl Check {
    pub fn convert(&self, symbols: &mut SymbolTable) -> datalog::Check {
        datalog::Check {
            kind: self.kind,
            queries: self.queries.iter().map(|q| q.convert(symbols)).collect(),
        }
    }
}

pub fn fact<N: Into<String>>(name: N, terms: &[Term]) -> Fact {
    Fact::new(name, terms.to_vec())
}

pub fn pred<N: Into<String>>(name: N, terms: &[Term]) -> Predicate {
    Predicate::new(name, terms.to_vec())
}

pub fn rule<N: Into<String>>(head_name: N, head_terms: &[Term], body: &[Predicate]) -> Rule {
    Rule::new(pred(head_name, head_terms), body.to_vec(), Vec::new(), Vec::new())
}

pub fn constrained_rule<N: Into<String>>(
    head_name: N,
    head_terms: &[Term],
    body: &[Predicate],
    expressions: &[Expression],
) -> Rule {
    Rule::new(pred(head_name, head_terms), body.to_vec(), expressions.to_vec(), Vec::new())
}

pub fn check_one(queries: &[Rule]) -> Check {
    Check { kind: CheckKind::One, queries: queries.to_vec() }
}

pub fn check_all(queries: &[Rule]) -> Check {
    Check { kind: CheckKind::All, queries: queries.to_vec() }
}

pub fn var(name: &str) -> Term {
    Term::Variable(name.to_string())
}

pub fn string(s: &str) -> Term {
    Term::Str(s.to_string())
}

pub fn int(i: i64) -> Term {
    Term::Integer(i)
}

/// Fails for instants before 1970.
pub fn date(t: DateTime<Utc>) -> Result<Term, Error> {
    Ok(Term::Date(unix_seconds(t)?))
}

pub fn bytes(b: &[u8]) -> Term {
    Term::Bytes(b.to_vec())
}

pub fn boolean(b: bool) -> Term {
    Term::Bool(b)
}

pub fn set(terms: BTreeSet<Term>) -> Term {
    Term::Set(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OFFSET;

    #[test]
    fn test_fact_conversion_interns_name_then_terms() {
        let mut symbols = SymbolTable::new();
        let f = fact("file", &[string("file1"), int(3)]).convert(&mut symbols);

        assert_eq!(symbols.local_symbols(), &["file".to_string(), "file1".to_string()]);
        assert_eq!(f.predicate.name, OFFSET);
        assert_eq!(f.predicate.terms, vec![datalog::Term::Str(OFFSET + 1), datalog::Term::Integer(3)]);
    }

    #[test]
    fn test_default_symbols_need_no_interning() {
        let mut symbols = SymbolTable::new();
        let p = pred("right", &[var("resource"), string("read")]).convert(&mut symbols);

        assert!(symbols.local_symbols().is_empty());
        assert_eq!(p.name, 4);
        assert_eq!(p.terms, vec![datalog::Term::Variable(2), datalog::Term::Str(0)]);
    }

    #[test]
    fn test_variables_share_string_ids() {
        let mut symbols = SymbolTable::new();
        let p = pred("grant", &[var("subject"), string("subject"), var("owner")]).convert(&mut symbols);

        assert_eq!(
            p.terms,
            vec![datalog::Term::Variable(OFFSET + 1), datalog::Term::Str(OFFSET + 1), datalog::Term::Variable(7)]
        );
    }

    #[test]
    fn test_scope_conversion_interns_key() {
        let mut symbols = SymbolTable::new();
        let key = crate::keys::tests::test_key(3);
        assert_eq!(Scope::PublicKey(key.clone()).convert(&mut symbols), datalog::Scope::PublicKey(0));
        assert_eq!(symbols.local_public_keys(), &[key]);
    }
}
