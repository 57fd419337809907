//! Renders interned values back into datalog surface syntax

use crate::datalog::{Binary, Check, CheckKind, Expression, Fact, Op, Predicate, Rule, Scope, SymbolTable, Term, Unary};
use crate::utils::time::format_rfc3339;

impl SymbolTable {
    fn print_symbol(&self, id: u64) -> String {
        match self.get_symbol(id) {
            Some(s) => s.to_string(),
            None => format!("<{}?>", id),
        }
    }

    pub fn print_term(&self, term: &Term) -> String {
        match term {
            Term::Variable(v) => format!("${}", self.print_symbol(*v)),
            Term::Integer(i) => i.to_string(),
            Term::Str(id) => match self.get_symbol(*id) {
                Some(s) => quote(s),
                None => format!("<{}?>", id),
            },
            Term::Date(d) => format_rfc3339(*d),
            Term::Bytes(b) => format!("hex:{}", hex::encode(b)),
            Term::Bool(b) => b.to_string(),
            Term::Set(set) => {
                let terms: Vec<String> = set.iter().map(|t| self.print_term(t)).collect();
                format!("[{}]", terms.join(", "))
            }
        }
    }

    pub fn print_predicate(&self, p: &Predicate) -> String {
        let terms: Vec<String> = p.terms.iter().map(|t| self.print_term(t)).collect();
        format!("{}({})", self.print_symbol(p.name), terms.join(", "))
    }

    pub fn print_fact(&self, f: &Fact) -> String {
        self.print_predicate(&f.predicate)
    }

    pub fn print_scope(&self, scope: &Scope) -> String {
        match scope {
            Scope::Authority => "authority".to_string(),
            Scope::Previous => "previous".to_string(),
            Scope::PublicKey(index) => match self.get_public_key(*index) {
                Some(key) => key.to_string(),
                None => format!("<key {}?>", index),
            },
        }
    }

    pub fn print_expression(&self, e: &Expression) -> String {
        let mut stack: Vec<String> = Vec::new();

        for op in &e.ops {
            match op {
                Op::Value(t) => stack.push(self.print_term(t)),
                Op::Unary(unary) => {
                    let value = stack.pop().unwrap_or_default();
                    stack.push(match unary {
                        Unary::Negate => format!("!{}", value),
                        Unary::Parens => format!("({})", value),
                        Unary::Length => format!("{}.length()", value),
                    });
                }
                Op::Binary(binary) => {
                    let right = stack.pop().unwrap_or_default();
                    let left = stack.pop().unwrap_or_default();
                    stack.push(print_binary(*binary, &left, &right));
                }
            }
        }

        stack.join(" ")
    }

    /// Body, constraints and scopes of a rule, without the head.
    fn print_rule_body(&self, r: &Rule) -> String {
        let mut items: Vec<String> = r.body.iter().map(|p| self.print_predicate(p)).collect();
        items.extend(r.expressions.iter().map(|e| self.print_expression(e)));
        let mut out = items.join(", ");

        if !r.scopes.is_empty() {
            let scopes: Vec<String> = r.scopes.iter().map(|s| self.print_scope(s)).collect();
            out.push_str(" trusting ");
            out.push_str(&scopes.join(", "));
        }
        out
    }

    pub fn print_rule(&self, r: &Rule) -> String {
        format!("{} <- {}", self.print_predicate(&r.head), self.print_rule_body(r))
    }

    pub fn print_check(&self, c: &Check) -> String {
        let queries: Vec<String> = c.queries.iter().map(|q| self.print_rule_body(q)).collect();
        let keyword = match c.kind {
            CheckKind::One => "check if",
            CheckKind::All => "check all",
        };
        format!("{} {}", keyword, queries.join(" or "))
    }
}

fn print_binary(op: Binary, left: &str, right: &str) -> String {
    let infix = match op {
        Binary::LessThan => "<",
        Binary::GreaterThan => ">",
        Binary::LessOrEqual => "<=",
        Binary::GreaterOrEqual => ">=",
        Binary::Equal => "==",
        Binary::NotEqual => "!=",
        Binary::Add => "+",
        Binary::Sub => "-",
        Binary::Mul => "*",
        Binary::Div => "/",
        Binary::And => "&&",
        Binary::Or => "||",
        Binary::BitwiseAnd => "&",
        Binary::BitwiseOr => "|",
        Binary::BitwiseXor => "^",
        Binary::Contains => return format!("{}.contains({})", left, right),
        Binary::Prefix => return format!("{}.starts_with({})", left, right),
        Binary::Suffix => return format!("{}.ends_with({})", left, right),
        Binary::Intersection => return format!("{}.intersection({})", left, right),
        Binary::Union => return format!("{}.union({})", left, right),
    };
    format!("{} {} {}", left, infix, right)
}

/// Escapes only what the datalog string reader understands; anything else
/// is written as is.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_constrained_rule() {
        let mut symbols = SymbolTable::new();
        let resource = symbols.insert("resource");
        let prefix = symbols.insert("prefix");
        let value = symbols.insert("/accounts/");

        let rule = Rule {
            head: Predicate::new(prefix, vec![Term::Variable(resource)]),
            body: vec![Predicate::new(resource, vec![Term::Variable(resource)])],
            expressions: vec![Expression {
                ops: vec![
                    Op::Value(Term::Variable(resource)),
                    Op::Value(Term::Str(value)),
                    Op::Binary(Binary::Prefix),
                ],
            }],
            scopes: vec![Scope::Authority],
        };

        assert_eq!(
            symbols.print_rule(&rule),
            r#"prefix($resource) <- resource($resource), $resource.starts_with("/accounts/") trusting authority"#
        );
    }

    #[test]
    fn test_print_terms() {
        let symbols = SymbolTable::new();
        assert_eq!(symbols.print_term(&Term::Date(0)), "1970-01-01T00:00:00Z");
        assert_eq!(symbols.print_term(&Term::Bytes(vec![0xca, 0xfe])), "hex:cafe");
        assert_eq!(symbols.print_term(&Term::Str(0)), "\"read\"");
    }

    #[test]
    fn test_printed_strings_parse_back() {
        use crate::builder::{fact, string};

        let raw = "a\r\0\u{7}\u{e9}\"q\"\\\n\tz";
        let mut symbols = SymbolTable::new();
        let interned = fact("note", &[string(raw)]).convert(&mut symbols);
        let printed = symbols.print_fact(&interned);

        assert_eq!(crate::parser::fact(&printed).unwrap(), fact("note", &[string(raw)]));
    }
}
