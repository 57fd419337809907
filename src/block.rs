//! Finalized, immutable blocks handed to the signer

use serde::{Serialize, Deserialize};

use crate::datalog::{Check, Fact, Rule, Scope, SymbolTable};
use crate::error::Error;
use crate::keys::PublicKey;
use crate::utils::hash::short_id;

/// Signature by an external key over a block's payload, filled in by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSignature {
    pub public_key: PublicKey,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the token the block was drafted for
    pub index: u32,
    /// Strings introduced by this block only, ids starting at `OFFSET`
    pub symbols: SymbolTable,
    /// Public keys introduced by this block only
    pub public_keys: Vec<PublicKey>,
    pub context: String,
    pub facts: Vec<Fact>,
    pub rules: Vec<Rule>,
    pub checks: Vec<Check>,
    pub scopes: Vec<Scope>,
    pub external_signature: Option<ExternalSignature>,
    pub version: u32,
}

/// The exact bytes a signer signs over. Never includes the signature itself
/// or any inherited symbols.
#[derive(Serialize)]
struct SignablePayload<'a> {
    symbols: &'a [String],
    public_keys: &'a [PublicKey],
    context: &'a str,
    facts: &'a [Fact],
    rules: &'a [Rule],
    checks: &'a [Check],
    scopes: &'a [Scope],
    version: u32,
}

impl Block {
    pub fn payload(&self) -> Result<Vec<u8>, Error> {
        let payload = SignablePayload {
            symbols: self.symbols.local_symbols(),
            public_keys: &self.public_keys,
            context: &self.context,
            facts: &self.facts,
            rules: &self.rules,
            checks: &self.checks,
            scopes: &self.scopes,
            version: self.version,
        };
        Ok(bincode::serialize(&payload)?)
    }

    /// Short content id of the signable payload.
    pub fn digest(&self) -> Result<String, Error> {
        Ok(short_id(&self.payload()?))
    }

    /// Attaches the signer's output, yielding a new block.
    pub fn with_external_signature(self, signature: ExternalSignature) -> Block {
        Block { external_signature: Some(signature), ..self }
    }

    /// Renders the block against the token's cumulative table, in which this
    /// block's symbols must already be merged.
    pub fn print(&self, symbols: &SymbolTable) -> String {
        let keys: Vec<String> = self.public_keys.iter().map(|k| k.to_string()).collect();
        let scopes: Vec<String> = self.scopes.iter().map(|s| symbols.print_scope(s)).collect();

        let mut out = String::from("Block {\n");
        out.push_str(&format!("    symbols: {:?}\n", self.symbols.local_symbols()));
        out.push_str(&format!("    public keys: {:?}\n", keys));
        out.push_str(&format!("    context: {:?}\n", self.context));
        out.push_str(&format!("    version: {}\n", self.version));
        out.push_str(&format!("    scopes: {:?}\n", scopes));
        out.push_str("    facts: [\n");
        for f in &self.facts {
            out.push_str(&format!("        {},\n", symbols.print_fact(f)));
        }
        out.push_str("    ]\n    rules: [\n");
        for r in &self.rules {
            out.push_str(&format!("        {},\n", symbols.print_rule(r)));
        }
        out.push_str("    ]\n    checks: [\n");
        for c in &self.checks {
            out.push_str(&format!("        {},\n", symbols.print_check(c)));
        }
        out.push_str("    ]\n}");
        out
    }
}
