use serde::{Deserialize, Serialize};
use std::path::Path;
use anyhow::Result;

use crate::builder::BlockBuilder;
use crate::chain::BlockChain;
use crate::error::Error;
use crate::parser::{ParseError, ParseErrorKind};
use crate::utils::time::parse_rfc3339;

pub const DEFAULT_CONFIG_FILE: &str = "chain.toml";

/// A token chain described as text, one `[[blocks]]` table per block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub blocks: Vec<BlockConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub context: String,
    pub facts: Vec<String>,
    pub rules: Vec<String>,
    pub checks: Vec<String>,
    pub scopes: Vec<String>,
    /// One `check_right` per entry
    pub rights: Vec<String>,
    pub resource_prefix: Option<String>,
    pub resource_suffix: Option<String>,
    /// RFC 3339 UTC, e.g. `2030-01-01T00:00:00Z`
    pub expires_at: Option<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            blocks: vec![
                BlockConfig {
                    context: "authority".to_string(),
                    facts: vec![
                        r#"right("/accounts/42/report", "read")"#.to_string(),
                        r#"right("/accounts/42/report", "write")"#.to_string(),
                    ],
                    ..Default::default()
                },
                BlockConfig {
                    context: "read-only delegation".to_string(),
                    rights: vec!["read".to_string()],
                    resource_prefix: Some("/accounts/42/".to_string()),
                    expires_at: Some("2030-01-01T00:00:00Z".to_string()),
                    ..Default::default()
                },
            ],
        }
    }
}

impl ChainConfig {
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)?;
        let config: ChainConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, config_path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Builds every block in order against the growing chain.
    pub fn build(&self) -> Result<BlockChain, Error> {
        let mut chain = BlockChain::new();
        for block in &self.blocks {
            let mut draft = chain.create_block();
            block.apply(&mut draft)?;
            chain.append(draft.finalize())?;
        }
        Ok(chain)
    }
}

impl BlockConfig {
    pub fn apply(&self, draft: &mut BlockBuilder) -> Result<(), Error> {
        draft.set_context(self.context.as_str());

        for scope in &self.scopes {
            draft.add_scope_str(scope)?;
        }
        for fact in &self.facts {
            draft.add_fact_str(fact)?;
        }
        for rule in &self.rules {
            draft.add_rule_str(rule)?;
        }
        for check in &self.checks {
            draft.add_check_str(check)?;
        }
        for right in &self.rights {
            draft.check_right(right);
        }
        if let Some(prefix) = &self.resource_prefix {
            draft.resource_prefix(prefix);
        }
        if let Some(suffix) = &self.resource_suffix {
            draft.resource_suffix(suffix);
        }
        if let Some(expires_at) = &self.expires_at {
            let expiration = parse_rfc3339(expires_at)
                .ok_or(ParseError { position: 0, kind: ParseErrorKind::InvalidDate })?;
            draft.expiration_date(expiration)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        let chain = ChainConfig::default().build().unwrap();
        assert_eq!(chain.len(), 2);

        let delegation = &chain.blocks()[1];
        assert_eq!(delegation.context, "read-only delegation");
        assert_eq!(delegation.checks.len(), 3);
        // report path was introduced by the first block
        assert!(!delegation.symbols.local_symbols().contains(&"/accounts/42/report".to_string()));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ChainConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ChainConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.blocks.len(), 2);
        assert_eq!(parsed.blocks[1].rights, vec!["read".to_string()]);
    }

    #[test]
    fn test_missing_fields_default() {
        let parsed: ChainConfig = toml::from_str(
            r#"
            [[blocks]]
            facts = ['user("alice")']
            "#,
        )
        .unwrap();
        assert_eq!(parsed.blocks[0].context, "");
        assert!(parsed.blocks[0].expires_at.is_none());
    }

    #[test]
    fn test_bad_expiry_is_parse_error() {
        let config = ChainConfig {
            blocks: vec![BlockConfig { expires_at: Some("tomorrow".to_string()), ..Default::default() }],
        };
        assert!(matches!(config.build(), Err(Error::Parse(_))));

        let config = ChainConfig {
            blocks: vec![BlockConfig { expires_at: Some("1969-07-20T20:17:40Z".to_string()), ..Default::default() }],
        };
        assert!(matches!(config.build(), Err(Error::InvalidDate(_))));
    }
}
