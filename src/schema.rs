//! Minimal block format version for a set of facts, rules, checks and scopes
//!
//! Each feature that a format revision introduced is listed in `Feature`
//! together with the first version able to encode it. A block's version is
//! the largest requirement among the features it uses, or the baseline when
//! it uses none. Adding content can therefore only raise the version.

use std::collections::BTreeSet;

use crate::constants::{MAX_SCHEMA_VERSION, MIN_SCHEMA_VERSION};
use crate::datalog::{Binary, Check, CheckKind, Expression, Fact, Op, Rule, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    /// Trust scopes at block, rule or check-query level
    Scopes,
    /// `check all`
    CheckAll,
    /// `&`, `|`, `^` on integers
    BitwiseOperators,
    /// `!=`
    NotEqual,
}

impl Feature {
    pub fn min_version(self) -> u32 {
        match self {
            Feature::Scopes => 4,
            Feature::CheckAll => 4,
            Feature::BitwiseOperators => 4,
            Feature::NotEqual => 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaVersion {
    features: BTreeSet<Feature>,
}

impl SchemaVersion {
    pub fn new(_facts: &[Fact], rules: &[Rule], checks: &[Check], scopes: &[Scope]) -> Self {
        let mut schema = Self::default();

        if !scopes.is_empty() {
            schema.features.insert(Feature::Scopes);
        }
        for rule in rules {
            schema.scan_rule(rule);
        }
        for check in checks {
            if check.kind == CheckKind::All {
                schema.features.insert(Feature::CheckAll);
            }
            for query in &check.queries {
                schema.scan_rule(query);
            }
        }

        schema
    }

    fn scan_rule(&mut self, rule: &Rule) {
        if !rule.scopes.is_empty() {
            self.features.insert(Feature::Scopes);
        }
        for expression in &rule.expressions {
            self.scan_expression(expression);
        }
    }

    fn scan_expression(&mut self, expression: &Expression) {
        for op in &expression.ops {
            match op {
                Op::Binary(Binary::BitwiseAnd | Binary::BitwiseOr | Binary::BitwiseXor) => {
                    self.features.insert(Feature::BitwiseOperators);
                }
                Op::Binary(Binary::NotEqual) => {
                    self.features.insert(Feature::NotEqual);
                }
                _ => {}
            }
        }
    }

    pub fn features(&self) -> &BTreeSet<Feature> {
        &self.features
    }

    pub fn version(&self) -> u32 {
        let version = self
            .features
            .iter()
            .map(|f| f.min_version())
            .fold(MIN_SCHEMA_VERSION, u32::max);
        debug_assert!(version <= MAX_SCHEMA_VERSION, "feature table exceeds newest format");
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::{Predicate, Term};

    fn query(expressions: Vec<Expression>, scopes: Vec<Scope>) -> Rule {
        Rule {
            head: Predicate::new(27, vec![]),
            body: vec![Predicate::new(5, vec![Term::Variable(1024)])],
            expressions,
            scopes,
        }
    }

    fn binary(op: Binary) -> Expression {
        Expression {
            ops: vec![Op::Value(Term::Integer(1)), Op::Value(Term::Integer(2)), Op::Binary(op)],
        }
    }

    #[test]
    fn test_empty_contents_use_baseline() {
        let schema = SchemaVersion::new(&[], &[], &[], &[]);
        assert!(schema.features().is_empty());
        assert_eq!(schema.version(), MIN_SCHEMA_VERSION);
    }

    #[test]
    fn test_plain_comparisons_stay_on_baseline() {
        let rules = vec![query(vec![binary(Binary::LessOrEqual), binary(Binary::Prefix)], vec![])];
        assert_eq!(SchemaVersion::new(&[], &rules, &[], &[]).version(), 3);
    }

    #[test]
    fn test_each_feature_detected() {
        let block_scope = SchemaVersion::new(&[], &[], &[], &[Scope::Authority]);
        assert!(block_scope.features().contains(&Feature::Scopes));
        assert_eq!(block_scope.version(), 4);

        let rule_scope = SchemaVersion::new(&[], &[query(vec![], vec![Scope::Previous])], &[], &[]);
        assert!(rule_scope.features().contains(&Feature::Scopes));

        let check_all = Check { kind: CheckKind::All, queries: vec![query(vec![], vec![])] };
        let schema = SchemaVersion::new(&[], &[], &[check_all], &[]);
        assert_eq!(schema.features().iter().copied().collect::<Vec<_>>(), vec![Feature::CheckAll]);

        let bitwise = Check { kind: CheckKind::One, queries: vec![query(vec![binary(Binary::BitwiseXor)], vec![])] };
        let schema = SchemaVersion::new(&[], &[], &[bitwise], &[]);
        assert!(schema.features().contains(&Feature::BitwiseOperators));

        let rules = vec![query(vec![binary(Binary::NotEqual)], vec![])];
        let schema = SchemaVersion::new(&[], &rules, &[], &[]);
        assert!(schema.features().contains(&Feature::NotEqual));
        assert_eq!(schema.version(), 4);
    }

    #[test]
    fn test_scan_is_order_independent() {
        let a = query(vec![binary(Binary::NotEqual)], vec![]);
        let b = query(vec![], vec![]);
        let forward = SchemaVersion::new(&[], &[a.clone(), b.clone()], &[], &[]);
        let backward = SchemaVersion::new(&[], &[b, a], &[], &[]);
        assert_eq!(forward, backward);
    }
}
