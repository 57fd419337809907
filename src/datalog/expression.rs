//! Reverse-polish constraint programs attached to rules

use std::collections::HashMap;
use serde::{Serialize, Deserialize};

use crate::datalog::{SymbolIndex, SymbolTable, Term};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Value(Term),
    Unary(Unary),
    Binary(Binary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unary {
    Negate,
    Parens,
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Binary {
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    Equal,
    NotEqual,
    Contains,
    Prefix,
    Suffix,
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Intersection,
    Union,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expression {
    pub ops: Vec<Op>,
}

impl Expression {
    /// Runs the program for one variable binding.
    ///
    /// Returns `None` for unbound variables, type mismatches, integer
    /// overflow, division by zero or a malformed program.
    pub fn evaluate(&self, values: &HashMap<SymbolIndex, Term>, symbols: &SymbolTable) -> Option<Term> {
        let mut stack: Vec<Term> = Vec::with_capacity(self.ops.len());

        for op in &self.ops {
            match op {
                Op::Value(Term::Variable(v)) => stack.push(values.get(v)?.clone()),
                Op::Value(term) => stack.push(term.clone()),
                Op::Unary(unary) => {
                    let value = stack.pop()?;
                    stack.push(unary.evaluate(value, symbols)?);
                }
                Op::Binary(binary) => {
                    let right = stack.pop()?;
                    let left = stack.pop()?;
                    stack.push(binary.evaluate(left, right, symbols)?);
                }
            }
        }

        if stack.len() == 1 {
            stack.pop()
        } else {
            None
        }
    }
}

impl Unary {
    fn evaluate(&self, value: Term, symbols: &SymbolTable) -> Option<Term> {
        match (*self, value) {
            (Unary::Negate, Term::Bool(b)) => Some(Term::Bool(!b)),
            (Unary::Parens, t) => Some(t),
            (Unary::Length, Term::Str(id)) => {
                let s = symbols.get_symbol(id)?;
                Some(Term::Integer(s.len() as i64))
            }
            (Unary::Length, Term::Bytes(b)) => Some(Term::Integer(b.len() as i64)),
            (Unary::Length, Term::Set(s)) => Some(Term::Integer(s.len() as i64)),
            _ => None,
        }
    }
}

impl Binary {
    fn evaluate(&self, left: Term, right: Term, symbols: &SymbolTable) -> Option<Term> {
        use Term::*;

        match (*self, left, right) {
            (Binary::LessThan, Integer(l), Integer(r)) => Some(Bool(l < r)),
            (Binary::LessThan, Date(l), Date(r)) => Some(Bool(l < r)),
            (Binary::GreaterThan, Integer(l), Integer(r)) => Some(Bool(l > r)),
            (Binary::GreaterThan, Date(l), Date(r)) => Some(Bool(l > r)),
            (Binary::LessOrEqual, Integer(l), Integer(r)) => Some(Bool(l <= r)),
            (Binary::LessOrEqual, Date(l), Date(r)) => Some(Bool(l <= r)),
            (Binary::GreaterOrEqual, Integer(l), Integer(r)) => Some(Bool(l >= r)),
            (Binary::GreaterOrEqual, Date(l), Date(r)) => Some(Bool(l >= r)),

            (Binary::Equal, l, r) => same_type(&l, &r).then(|| Bool(l == r)),
            (Binary::NotEqual, l, r) => same_type(&l, &r).then(|| Bool(l != r)),

            (Binary::Contains, Set(set), Set(other)) => Some(Bool(other.is_subset(&set))),
            (Binary::Contains, Set(set), t) => Some(Bool(set.contains(&t))),
            (Binary::Contains, Str(l), Str(r)) => {
                Some(Bool(symbols.get_symbol(l)?.contains(symbols.get_symbol(r)?)))
            }
            (Binary::Prefix, Str(l), Str(r)) => {
                Some(Bool(symbols.get_symbol(l)?.starts_with(symbols.get_symbol(r)?)))
            }
            (Binary::Suffix, Str(l), Str(r)) => {
                Some(Bool(symbols.get_symbol(l)?.ends_with(symbols.get_symbol(r)?)))
            }

            (Binary::Add, Integer(l), Integer(r)) => l.checked_add(r).map(Integer),
            (Binary::Sub, Integer(l), Integer(r)) => l.checked_sub(r).map(Integer),
            (Binary::Mul, Integer(l), Integer(r)) => l.checked_mul(r).map(Integer),
            (Binary::Div, Integer(l), Integer(r)) => l.checked_div(r).map(Integer),

            (Binary::And, Bool(l), Bool(r)) => Some(Bool(l && r)),
            (Binary::Or, Bool(l), Bool(r)) => Some(Bool(l || r)),

            (Binary::Intersection, Set(l), Set(r)) => Some(Set(l.intersection(&r).cloned().collect())),
            (Binary::Union, Set(l), Set(r)) => Some(Set(l.union(&r).cloned().collect())),

            (Binary::BitwiseAnd, Integer(l), Integer(r)) => Some(Integer(l & r)),
            (Binary::BitwiseOr, Integer(l), Integer(r)) => Some(Integer(l | r)),
            (Binary::BitwiseXor, Integer(l), Integer(r)) => Some(Integer(l ^ r)),

            _ => None,
        }
    }
}

fn same_type(l: &Term, r: &Term) -> bool {
    std::mem::discriminant(l) == std::mem::discriminant(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn binary(l: Term, op: Binary, r: Term) -> Expression {
        Expression { ops: vec![Op::Value(l), Op::Value(r), Op::Binary(op)] }
    }

    #[test]
    fn test_date_bound_is_inclusive() {
        let symbols = SymbolTable::new();
        let mut values = HashMap::new();
        values.insert(0, Term::Date(1_000));

        let e = binary(Term::Variable(0), Binary::LessOrEqual, Term::Date(1_000));
        assert_eq!(e.evaluate(&values, &symbols), Some(Term::Bool(true)));

        values.insert(0, Term::Date(1_001));
        assert_eq!(e.evaluate(&values, &symbols), Some(Term::Bool(false)));
    }

    #[test]
    fn test_string_prefix_and_suffix() {
        let mut symbols = SymbolTable::new();
        let path = symbols.insert("/accounts/42/balance");
        let prefix = symbols.insert("/accounts/42/");
        let suffix = symbols.insert("balance");

        let e = binary(Term::Str(path), Binary::Prefix, Term::Str(prefix));
        assert_eq!(e.evaluate(&HashMap::new(), &symbols), Some(Term::Bool(true)));
        let e = binary(Term::Str(path), Binary::Suffix, Term::Str(suffix));
        assert_eq!(e.evaluate(&HashMap::new(), &symbols), Some(Term::Bool(true)));
        let e = binary(Term::Str(prefix), Binary::Prefix, Term::Str(path));
        assert_eq!(e.evaluate(&HashMap::new(), &symbols), Some(Term::Bool(false)));
    }

    #[test]
    fn test_failures_yield_none() {
        let symbols = SymbolTable::new();
        let none = HashMap::new();

        assert_eq!(binary(Term::Integer(1), Binary::Div, Term::Integer(0)).evaluate(&none, &symbols), None);
        assert_eq!(binary(Term::Integer(i64::MAX), Binary::Add, Term::Integer(1)).evaluate(&none, &symbols), None);
        assert_eq!(binary(Term::Integer(1), Binary::Equal, Term::Bool(true)).evaluate(&none, &symbols), None);
        assert_eq!(binary(Term::Variable(3), Binary::Equal, Term::Integer(1)).evaluate(&none, &symbols), None);
    }

    #[test]
    fn test_set_operations() {
        let symbols = SymbolTable::new();
        let a: BTreeSet<Term> = [Term::Integer(1), Term::Integer(2)].into_iter().collect();
        let b: BTreeSet<Term> = [Term::Integer(2), Term::Integer(3)].into_iter().collect();

        let e = Expression {
            ops: vec![
                Op::Value(Term::Set(a.clone())),
                Op::Value(Term::Set(b)),
                Op::Binary(Binary::Intersection),
                Op::Unary(Unary::Length),
            ],
        };
        assert_eq!(e.evaluate(&HashMap::new(), &symbols), Some(Term::Integer(1)));

        let e = binary(Term::Set(a), Binary::Contains, Term::Integer(2));
        assert_eq!(e.evaluate(&HashMap::new(), &symbols), Some(Term::Bool(true)));
    }
}
