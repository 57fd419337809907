//! Block construction for capability tokens made of append-only Datalog blocks.
//!
//! A `BlockBuilder` opens a private view of the token's cumulative
//! `SymbolTable`, accumulates facts, rules, checks and scopes, and is consumed
//! by `finalize` into an immutable `Block` carrying only the strings and
//! public keys it introduced, plus the lowest format version able to encode it.

pub mod constants;
pub mod error;
pub mod keys;
pub mod datalog;
pub mod builder;
pub mod parser;
pub mod schema;
pub mod block;
pub mod chain;
pub mod config;
pub mod utils;

pub use block::{Block, ExternalSignature};
pub use builder::BlockBuilder;
pub use chain::BlockChain;
pub use datalog::SymbolTable;
pub use error::Error;
pub use keys::PublicKey;
pub use schema::SchemaVersion;
