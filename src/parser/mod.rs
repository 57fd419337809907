//! Datalog surface syntax -> builder values
//!
//! ```text
//! fact   := name "(" ground_term, ... ")"
//! rule   := predicate "<-" body
//! check  := "check" ("if" | "all") body ("or" body)*
//! body   := (predicate | expression), ... ["trusting" scope, ...]
//! scope  := "authority" | "previous" | "ed25519/" hex
//! ```
//!
//! Every entry point parses the whole input or fails without side effects.

pub mod error;

use std::collections::{BTreeSet, HashSet};

pub use error::{ParseError, ParseErrorKind};

use crate::builder::{
    pred, Binary, Check, CheckKind, Expression, Fact, Op, Predicate, Rule, Scope, Term, Unary,
};
use crate::constants::MAX_NESTING_DEPTH;
use crate::keys::PublicKey;
use crate::utils::time::{parse_rfc3339, unix_seconds};

pub type ParseResult<T> = Result<T, ParseError>;

pub fn fact(input: &str) -> ParseResult<Fact> {
    let mut p = Parser::new(input);
    let predicate = p.predicate(true)?;
    p.end()?;
    Ok(Fact { predicate })
}

pub fn rule(input: &str) -> ParseResult<Rule> {
    let mut p = Parser::new(input);
    let (head, head_positions) = p.spanned_predicate(false)?;
    p.expect("<-")?;
    let (body, expressions, scopes) = p.rule_body()?;
    p.end()?;

    let bound: HashSet<&str> = body
        .iter()
        .flat_map(|pred| pred.terms.iter())
        .filter_map(|t| match t {
            Term::Variable(v) => Some(v.as_str()),
            _ => None,
        })
        .collect();
    for (term, &position) in head.terms.iter().zip(&head_positions) {
        if let Term::Variable(v) = term {
            if !bound.contains(v.as_str()) {
                return Err(ParseError { position, kind: ParseErrorKind::UnboundHeadVariable(v.clone()) });
            }
        }
    }

    Ok(Rule::new(head, body, expressions, scopes))
}

pub fn check(input: &str) -> ParseResult<Check> {
    let mut p = Parser::new(input);
    if !p.eat_keyword("check") {
        return Err(p.expected("check"));
    }
    let kind = if p.eat_keyword("if") {
        CheckKind::One
    } else if p.eat_keyword("all") {
        CheckKind::All
    } else {
        return Err(p.expected("if or all"));
    };

    let mut queries = Vec::new();
    loop {
        let (body, expressions, scopes) = p.rule_body()?;
        queries.push(Rule::new(pred("query", &[]), body, expressions, scopes));
        if !p.eat_keyword("or") {
            break;
        }
    }
    p.end()?;

    Ok(Check { kind, queries })
}

pub fn scope(input: &str) -> ParseResult<Scope> {
    let mut p = Parser::new(input);
    let scope = p.scope()?;
    p.end()?;
    Ok(scope)
}

pub fn expression(input: &str) -> ParseResult<Expression> {
    let mut p = Parser::new(input);
    let e = p.expression()?;
    p.end()?;
    Ok(e)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0, depth: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError { position: self.pos, kind }
    }

    fn expected(&self, what: &'static str) -> ParseError {
        if self.pos >= self.input.len() {
            self.error(ParseErrorKind::UnexpectedEnd(what))
        } else {
            self.error(ParseErrorKind::Expected(what))
        }
    }

    /// Runs `f` one nesting level deeper, failing past `MAX_NESTING_DEPTH`.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(ParseErrorKind::TooDeep));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// Eats a one-character operator unless it is the first half of `op op`.
    fn eat_single(&mut self, op: char) -> bool {
        self.skip_ws();
        let mut chars = self.rest().chars();
        if chars.next() == Some(op) && chars.next() != Some(op) {
            self.pos += op.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if rest.starts_with(keyword) && !rest[keyword.len()..].starts_with(is_ident_char) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &'static str) -> ParseResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.expected(token))
        }
    }

    fn end(&mut self) -> ParseResult<()> {
        self.skip_ws();
        if self.pos < self.input.len() {
            Err(self.error(ParseErrorKind::TrailingInput))
        } else {
            Ok(())
        }
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !f(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn identifier(&mut self) -> ParseResult<&'a str> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => Ok(self.take_while(is_ident_char)),
            _ => Err(self.expected("identifier")),
        }
    }

    fn predicate(&mut self, ground: bool) -> ParseResult<Predicate> {
        self.spanned_predicate(ground).map(|(predicate, _)| predicate)
    }

    /// Also returns the offset at which each term starts.
    fn spanned_predicate(&mut self, ground: bool) -> ParseResult<(Predicate, Vec<usize>)> {
        let name = self.identifier()?;
        self.expect("(")?;

        let mut terms = Vec::new();
        let mut positions = Vec::new();
        if !self.eat(")") {
            loop {
                self.skip_ws();
                positions.push(self.pos);
                terms.push(self.term(ground)?);
                if !self.eat(",") {
                    break;
                }
            }
            self.expect(")")?;
        }

        Ok((Predicate::new(name, terms), positions))
    }

    /// Looks ahead for `name (` without consuming anything.
    fn at_predicate(&mut self) -> bool {
        let start = self.pos;
        let found = match self.identifier() {
            Ok("true") | Ok("false") | Err(_) => false,
            Ok(_) => {
                self.skip_ws();
                self.peek() == Some('(')
            }
        };
        self.pos = start;
        found
    }

    fn term(&mut self, ground: bool) -> ParseResult<Term> {
        self.skip_ws();
        let start = self.pos;

        match self.peek() {
            Some('$') => {
                self.pos += 1;
                let name = self.take_while(is_ident_char);
                if name.is_empty() {
                    return Err(self.expected("variable name"));
                }
                if ground {
                    return Err(ParseError {
                        position: start,
                        kind: ParseErrorKind::VariableInFact(name.to_string()),
                    });
                }
                Ok(Term::Variable(name.to_string()))
            }
            Some('"') => self.string().map(Term::Str),
            Some('[') => {
                self.pos += 1;
                let mut set = BTreeSet::new();
                if !self.eat("]") {
                    loop {
                        set.insert(self.nested(|p| p.term(true))?);
                        if !self.eat(",") {
                            break;
                        }
                    }
                    self.expect("]")?;
                }
                Ok(Term::Set(set))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => self.number_or_date(),
            _ => {
                if self.eat("hex:") {
                    let digits = self.take_while(|c| c.is_ascii_hexdigit());
                    hex::decode(digits)
                        .map(Term::Bytes)
                        .map_err(|_| ParseError { position: start, kind: ParseErrorKind::InvalidHex })
                } else if self.eat_keyword("true") {
                    Ok(Term::Bool(true))
                } else if self.eat_keyword("false") {
                    Ok(Term::Bool(false))
                } else {
                    Err(self.expected("term"))
                }
            }
        }
    }

    fn string(&mut self) -> ParseResult<String> {
        // opening quote
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, '"')) => out.push('"'),
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((j, _)) => {
                        self.pos += j;
                        return Err(self.error(ParseErrorKind::Expected("escape sequence")));
                    }
                    None => break,
                },
                c => out.push(c),
            }
        }

        self.pos = self.input.len();
        Err(self.error(ParseErrorKind::UnexpectedEnd("closing quote")))
    }

    fn number_or_date(&mut self) -> ParseResult<Term> {
        let start = self.pos;
        let rest = self.rest();
        let bytes = rest.as_bytes();

        if bytes.len() >= 11 && bytes[0].is_ascii_digit() && bytes[4] == b'-' && bytes[10] == b'T' {
            let seconds = rest
                .get(..20)
                .and_then(parse_rfc3339)
                .and_then(|date| unix_seconds(date).ok())
                .ok_or(ParseError { position: start, kind: ParseErrorKind::InvalidDate })?;
            self.pos += 20;
            return Ok(Term::Date(seconds));
        }

        let negative = rest.starts_with('-');
        if negative {
            self.pos += 1;
        }
        let digits = self.take_while(|c| c.is_ascii_digit());
        let literal = &self.input[start..start + usize::from(negative) + digits.len()];
        literal
            .parse::<i64>()
            .map(Term::Integer)
            .map_err(|_| ParseError { position: start, kind: ParseErrorKind::InvalidInteger })
    }

    fn rule_body(&mut self) -> ParseResult<(Vec<Predicate>, Vec<Expression>, Vec<Scope>)> {
        let mut body = Vec::new();
        let mut expressions = Vec::new();
        let mut scopes = Vec::new();

        loop {
            if self.at_predicate() {
                body.push(self.predicate(false)?);
            } else {
                expressions.push(self.expression()?);
            }
            if !self.eat(",") {
                break;
            }
        }

        if self.eat_keyword("trusting") {
            loop {
                scopes.push(self.scope()?);
                if !self.eat(",") {
                    break;
                }
            }
        }

        Ok((body, expressions, scopes))
    }

    fn scope(&mut self) -> ParseResult<Scope> {
        self.skip_ws();
        let start = self.pos;

        if self.eat_keyword("authority") {
            Ok(Scope::Authority)
        } else if self.eat_keyword("previous") {
            Ok(Scope::Previous)
        } else if self.eat("ed25519/") {
            let digits = self.take_while(|c| c.is_ascii_hexdigit());
            PublicKey::from_hex(digits).map(Scope::PublicKey).map_err(|e| ParseError {
                position: start,
                kind: ParseErrorKind::InvalidPublicKey(e.to_string()),
            })
        } else {
            Err(self.expected("scope"))
        }
    }

    fn expression(&mut self) -> ParseResult<Expression> {
        let mut ops = Vec::new();
        self.or_expr(&mut ops)?;
        Ok(Expression { ops })
    }

    fn or_expr(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.and_expr(ops)?;
        while self.eat("||") {
            self.and_expr(ops)?;
            ops.push(Op::Binary(Binary::Or));
        }
        Ok(())
    }

    fn and_expr(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.comparison(ops)?;
        while self.eat("&&") {
            self.comparison(ops)?;
            ops.push(Op::Binary(Binary::And));
        }
        Ok(())
    }

    fn comparison(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.bit_or(ops)?;

        const COMPARISONS: [(&str, Binary); 6] = [
            ("<=", Binary::LessOrEqual),
            (">=", Binary::GreaterOrEqual),
            ("==", Binary::Equal),
            ("!=", Binary::NotEqual),
            ("<", Binary::LessThan),
            (">", Binary::GreaterThan),
        ];
        for (token, op) in COMPARISONS {
            if self.eat(token) {
                self.bit_or(ops)?;
                ops.push(Op::Binary(op));
                break;
            }
        }
        Ok(())
    }

    fn bit_or(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.bit_xor(ops)?;
        while self.eat_single('|') {
            self.bit_xor(ops)?;
            ops.push(Op::Binary(Binary::BitwiseOr));
        }
        Ok(())
    }

    fn bit_xor(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.bit_and(ops)?;
        while self.eat("^") {
            self.bit_and(ops)?;
            ops.push(Op::Binary(Binary::BitwiseXor));
        }
        Ok(())
    }

    fn bit_and(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.additive(ops)?;
        while self.eat_single('&') {
            self.additive(ops)?;
            ops.push(Op::Binary(Binary::BitwiseAnd));
        }
        Ok(())
    }

    fn additive(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.multiplicative(ops)?;
        loop {
            let op = if self.eat("+") {
                Binary::Add
            } else if self.eat("-") {
                Binary::Sub
            } else {
                break;
            };
            self.multiplicative(ops)?;
            ops.push(Op::Binary(op));
        }
        Ok(())
    }

    fn multiplicative(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.unary(ops)?;
        loop {
            let op = if self.eat("*") {
                Binary::Mul
            } else if self.eat("/") {
                Binary::Div
            } else {
                break;
            };
            self.unary(ops)?;
            ops.push(Op::Binary(op));
        }
        Ok(())
    }

    fn unary(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        if self.eat("!") {
            self.nested(|p| p.unary(ops))?;
            ops.push(Op::Unary(Unary::Negate));
            Ok(())
        } else {
            self.postfix(ops)
        }
    }

    fn postfix(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        self.primary(ops)?;

        while self.eat(".") {
            let start = self.pos;
            let method = self.identifier()?;
            self.expect("(")?;

            let op = match method {
                "length" => {
                    self.expect(")")?;
                    ops.push(Op::Unary(Unary::Length));
                    continue;
                }
                "starts_with" => Binary::Prefix,
                "ends_with" => Binary::Suffix,
                "contains" => Binary::Contains,
                "intersection" => Binary::Intersection,
                "union" => Binary::Union,
                other => {
                    return Err(ParseError {
                        position: start,
                        kind: ParseErrorKind::UnknownMethod(other.to_string()),
                    })
                }
            };
            self.nested(|p| p.or_expr(ops))?;
            self.expect(")")?;
            ops.push(Op::Binary(op));
        }
        Ok(())
    }

    fn primary(&mut self, ops: &mut Vec<Op>) -> ParseResult<()> {
        if self.eat("(") {
            self.nested(|p| p.or_expr(ops))?;
            self.expect(")")?;
            ops.push(Op::Unary(Unary::Parens));
        } else {
            let term = self.term(false)?;
            ops.push(Op::Value(term));
        }
        Ok(())
    }
}
