//! Format constants shared by every block of a token

/// First id handed out to a block-local string. Ids below it are well-known.
pub const OFFSET: u64 = 1024;

/// Baseline block format
pub const MIN_SCHEMA_VERSION: u32 = 3;

/// Newest block format this crate can produce
pub const MAX_SCHEMA_VERSION: u32 = 4;

/// Well-known strings, shared by all tokens without being serialized.
/// Position in this list is the symbol id.
pub const DEFAULT_SYMBOLS: [&str; 28] = [
    "read",
    "write",
    "resource",
    "operation",
    "right",
    "time",
    "role",
    "owner",
    "tenant",
    "namespace",
    "user",
    "team",
    "service",
    "admin",
    "email",
    "group",
    "member",
    "ip_address",
    "client",
    "client_ip",
    "domain",
    "path",
    "version",
    "cluster",
    "node",
    "hostname",
    "nonce",
    "query",
];

/// Length of an Ed25519 public key
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Deepest nesting of parentheses, negations, sets and method arguments the
/// datalog parser accepts
pub const MAX_NESTING_DEPTH: usize = 128;
