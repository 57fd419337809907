//! Mutable block draft, finalized once into an immutable `Block`

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::block::Block;
use crate::builder::{policy, Check, Fact, Rule, Scope};
use crate::datalog::{self, SymbolTable};
use crate::error::Error;
use crate::parser;
use crate::schema::SchemaVersion;

/// Accumulates one block's facts, rules, checks and scopes against a private
/// view of the token's symbol table.
///
/// Everything interned while building lands in the view's local layer, which
/// `finalize` extracts as the block's own symbol table. Only one thread may
/// mutate a draft; `finalize` consumes it so a draft can never be finalized
/// twice or changed afterwards.
#[derive(Debug)]
pub struct BlockBuilder {
    index: u32,
    symbol_start: usize,
    public_key_start: usize,
    symbols: SymbolTable,
    context: String,
    facts: Vec<datalog::Fact>,
    rules: Vec<datalog::Rule>,
    checks: Vec<datalog::Check>,
    scopes: Vec<datalog::Scope>,
}

impl BlockBuilder {
    /// `index` is the block's position in the token, assigned by the caller.
    pub fn new(index: u32, base_symbols: &Arc<SymbolTable>) -> Self {
        let symbol_start = base_symbols.current_offset();
        let public_key_start = base_symbols.current_public_key_offset();
        debug!(index, symbol_start, public_key_start, "opening block draft");

        Self {
            index,
            symbol_start,
            public_key_start,
            symbols: SymbolTable::view(base_symbols),
            context: String::new(),
            facts: Vec::new(),
            rules: Vec::new(),
            checks: Vec::new(),
            scopes: Vec::new(),
        }
    }

    pub fn add_fact(&mut self, fact: Fact) -> &mut Self {
        self.facts.push(fact.convert(&mut self.symbols));
        self
    }

    pub fn add_fact_str(&mut self, s: &str) -> Result<&mut Self, Error> {
        let fact = parser::fact(s)?;
        Ok(self.add_fact(fact))
    }

    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule.convert(&mut self.symbols));
        self
    }

    pub fn add_rule_str(&mut self, s: &str) -> Result<&mut Self, Error> {
        let rule = parser::rule(s)?;
        Ok(self.add_rule(rule))
    }

    pub fn add_check(&mut self, check: Check) -> &mut Self {
        self.checks.push(check.convert(&mut self.symbols));
        self
    }

    pub fn add_check_str(&mut self, s: &str) -> Result<&mut Self, Error> {
        let check = parser::check(s)?;
        Ok(self.add_check(check))
    }

    pub fn add_scope(&mut self, scope: Scope) -> &mut Self {
        self.scopes.push(scope.convert(&mut self.symbols));
        self
    }

    pub fn add_scope_str(&mut self, s: &str) -> Result<&mut Self, Error> {
        let scope = parser::scope(s)?;
        Ok(self.add_scope(scope))
    }

    pub fn set_context(&mut self, context: impl Into<String>) -> &mut Self {
        self.context = context.into();
        self
    }

    pub fn check_right(&mut self, right: &str) -> &mut Self {
        self.add_check(policy::check_right(right))
    }

    pub fn resource_prefix(&mut self, prefix: &str) -> &mut Self {
        self.add_check(policy::resource_prefix(prefix))
    }

    pub fn resource_suffix(&mut self, suffix: &str) -> &mut Self {
        self.add_check(policy::resource_suffix(suffix))
    }

    pub fn expiration_date(&mut self, expiration: DateTime<Utc>) -> Result<&mut Self, Error> {
        let check = policy::expiration_date(expiration)?;
        Ok(self.add_check(check))
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn symbol_start(&self) -> usize {
        self.symbol_start
    }

    pub fn public_key_start(&self) -> usize {
        self.public_key_start
    }

    /// The draft's view: inherited entries plus everything interned so far.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn facts(&self) -> &[datalog::Fact] {
        &self.facts
    }

    pub fn rules(&self) -> &[datalog::Rule] {
        &self.rules
    }

    pub fn checks(&self) -> &[datalog::Check] {
        &self.checks
    }

    pub fn scopes(&self) -> &[datalog::Scope] {
        &self.scopes
    }

    /// Extracts the strings and keys added since the draft opened and moves
    /// the contents into an unsigned `Block`.
    pub fn finalize(self) -> Block {
        let schema = SchemaVersion::new(&self.facts, &self.rules, &self.checks, &self.scopes);
        let version = schema.version();

        let symbol_count = self.symbols.current_offset() - self.symbol_start;
        let key_count = self.symbols.current_public_key_offset() - self.public_key_start;
        let (symbols, public_keys) = self.symbols.into_local();
        debug_assert_eq!(symbols.len(), symbol_count);
        debug_assert_eq!(public_keys.len(), key_count);

        debug!(
            index = self.index,
            symbols = symbol_count,
            public_keys = key_count,
            version,
            features = ?schema.features(),
            "finalized block"
        );

        Block {
            index: self.index,
            symbols: SymbolTable::from_local(symbols, Vec::new()),
            public_keys,
            context: self.context,
            facts: self.facts,
            rules: self.rules,
            checks: self.checks,
            scopes: self.scopes,
            external_signature: None,
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{fact, string, var};
    use crate::constants::{MIN_SCHEMA_VERSION, OFFSET};
    use crate::keys::tests::test_key;
    use crate::parser::ParseErrorKind;

    fn base_with(strings: &[&str]) -> Arc<SymbolTable> {
        let mut base = SymbolTable::new();
        for s in strings {
            base.insert(s);
        }
        Arc::new(base)
    }

    #[test]
    fn test_empty_draft_finalizes_to_empty_block() {
        let base = base_with(&["inherited"]);
        let block = BlockBuilder::new(1, &base).finalize();

        assert!(block.facts.is_empty());
        assert!(block.rules.is_empty());
        assert!(block.checks.is_empty());
        assert!(block.scopes.is_empty());
        assert!(block.symbols.local_symbols().is_empty());
        assert!(block.public_keys.is_empty());
        assert!(block.external_signature.is_none());
        assert_eq!(block.index, 1);
        assert_eq!(block.context, "");
        assert_eq!(block.version, MIN_SCHEMA_VERSION);
    }

    #[test]
    fn test_only_new_symbols_are_extracted() {
        let base = base_with(&["file1"]);
        let mut draft = BlockBuilder::new(1, &base);
        draft
            .add_fact(fact("owner", &[string("alice"), string("file1")]))
            .add_fact(fact("owner", &[string("bob"), string("file1")]));

        assert_eq!(draft.symbol_start(), 1);
        let block = draft.finalize();
        assert_eq!(block.symbols.local_symbols(), &["alice".to_string(), "bob".to_string()]);
        assert_eq!(block.symbols.get_symbol(OFFSET), Some("alice"));
        // ids in the facts stay absolute
        assert_eq!(block.facts[0].predicate.terms[1], datalog::Term::Str(OFFSET));
        assert_eq!(block.facts[0].predicate.terms[0], datalog::Term::Str(OFFSET + 1));
        assert_eq!(base.current_offset(), 1);
    }

    #[test]
    fn test_only_new_public_keys_are_extracted() {
        let mut base = SymbolTable::new();
        base.insert_public_key(&test_key(1));
        let base = Arc::new(base);

        let mut draft = BlockBuilder::new(1, &base);
        draft
            .add_scope(Scope::PublicKey(test_key(1)))
            .add_scope(Scope::PublicKey(test_key(2)));
        assert_eq!(draft.public_key_start(), 1);

        let block = draft.finalize();
        assert_eq!(block.public_keys, vec![test_key(2)]);
        assert_eq!(block.scopes, vec![datalog::Scope::PublicKey(0), datalog::Scope::PublicKey(1)]);
        assert_eq!(block.version, 4);
    }

    #[test]
    fn test_parse_failure_leaves_draft_untouched() {
        let base = base_with(&[]);
        let mut draft = BlockBuilder::new(0, &base);
        draft.add_fact_str(r#"right("file1", "read")"#).unwrap();

        let err = draft.add_rule_str("broken($x) <- ").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ref e) if matches!(e.kind, ParseErrorKind::UnexpectedEnd(_))
        ));
        assert!(draft.add_check_str("check if fresh_symbol($v), $v ==").is_err());

        assert_eq!(draft.facts().len(), 1);
        assert!(draft.rules().is_empty());
        assert!(draft.checks().is_empty());
        assert_eq!(draft.symbols().local_symbols(), &["file1".to_string()]);
    }

    #[test]
    fn test_set_context_replaces_without_interning() {
        let base = base_with(&[]);
        let mut draft = BlockBuilder::new(0, &base);
        draft.set_context("first").set_context("second");
        assert_eq!(draft.context(), "second");

        let block = draft.finalize();
        assert_eq!(block.context, "second");
        assert!(block.symbols.local_symbols().is_empty());
    }

    #[test]
    fn test_resource_prefix_scenario() {
        let base = base_with(&[]);
        let mut draft = BlockBuilder::new(1, &base);
        draft.resource_prefix("/accounts/42/");
        let block = draft.finalize();

        assert_eq!(block.checks.len(), 1);
        let check = &block.checks[0];
        assert_eq!(check.kind, datalog::CheckKind::One);
        assert_eq!(check.queries.len(), 1);

        let mut symbols = SymbolTable::new();
        symbols.extend(&block.symbols).unwrap();
        let q = &check.queries[0];
        assert_eq!(symbols.get_symbol(q.head.name), Some("prefix"));
        assert_eq!(symbols.print_predicate(&q.head), "prefix($resource)");
        assert_eq!(q.body.len(), 1);
        assert_eq!(symbols.print_predicate(&q.body[0]), "resource($resource)");
        assert_eq!(q.expressions.len(), 1);
        assert_eq!(
            symbols.print_expression(&q.expressions[0]),
            r#"$resource.starts_with("/accounts/42/")"#
        );
        assert_eq!(block.version, MIN_SCHEMA_VERSION);
    }

    #[test]
    fn test_templates_reuse_default_symbols() {
        let base = base_with(&[]);
        let mut draft = BlockBuilder::new(1, &base);
        draft.check_right("read");
        // check_right is the only new string; the rest are well-known
        assert_eq!(draft.symbols().local_symbols(), &["check_right".to_string()]);

        draft.check_right("read");
        assert_eq!(draft.symbols().local_symbols().len(), 1);
        assert_eq!(draft.checks()[0], draft.checks()[1]);
    }

    #[test]
    fn test_sibling_drafts_do_not_share_local_symbols() {
        let base = base_with(&["shared"]);
        let mut a = BlockBuilder::new(1, &base);
        let mut b = BlockBuilder::new(1, &base);
        a.add_fact(fact("a_only", &[string("shared")]));
        b.add_fact(fact("b_only", &[var("x")]));

        assert_eq!(a.symbols().symbol_id("b_only"), None);
        assert_eq!(b.symbols().symbol_id("a_only"), None);
        assert_eq!(a.finalize().symbols.local_symbols(), &["a_only".to_string()]);
        assert_eq!(b.finalize().symbols.local_symbols(), &["b_only".to_string(), "x".to_string()]);
    }
}
