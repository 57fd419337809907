use attenuate::config::{ChainConfig, DEFAULT_CONFIG_FILE};
use attenuate::BlockChain;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "attenuate")]
#[command(about = "Build token blocks from a chain description")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Build every block and show its symbol window, version and digest
    Build {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: String,
    },
    /// Build every block and render it in datalog syntax
    Print {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: String,
    },
    /// Write an example chain description
    GenerateConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE, help = "Config file path")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("attenuate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { config } => {
            let chain = load_chain(&config)?;

            if cli.json {
                let mut blocks = Vec::new();
                for (index, block) in chain.blocks().iter().enumerate() {
                    blocks.push(serde_json::json!({
                        "index": index,
                        "version": block.version,
                        "digest": block.digest()?,
                        "symbols": block.symbols.local_symbols(),
                        "public_keys": block.public_keys.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
                        "facts": block.facts.len(),
                        "rules": block.rules.len(),
                        "checks": block.checks.len(),
                        "scopes": block.scopes.len(),
                    }));
                }
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                    "blocks": blocks,
                    "total_symbols": chain.symbols().current_offset(),
                    "total_public_keys": chain.symbols().current_public_key_offset(),
                }))?);
            } else {
                println!("🧱 Token Blocks");
                println!("===============");
                for (index, block) in chain.blocks().iter().enumerate() {
                    println!("Block {}: {:?}", index, block.context);
                    println!("   Version: {}", block.version);
                    println!("   Digest: {}", block.digest()?);
                    println!("   New symbols: {:?}", block.symbols.local_symbols());
                    println!("   New public keys: {}", block.public_keys.len());
                    println!(
                        "   Facts/rules/checks/scopes: {}/{}/{}/{}",
                        block.facts.len(),
                        block.rules.len(),
                        block.checks.len(),
                        block.scopes.len()
                    );
                }
                println!("Total symbols: {}", chain.symbols().current_offset());
            }
        }
        Commands::Print { config } => {
            let chain = load_chain(&config)?;

            if cli.json {
                let rendered: Vec<String> = chain.blocks().iter().map(|b| b.print(chain.symbols())).collect();
                println!("{}", serde_json::json!({ "blocks": rendered }));
            } else {
                for (index, block) in chain.blocks().iter().enumerate() {
                    println!("// block {}", index);
                    println!("{}", block.print(chain.symbols()));
                }
            }
        }
        Commands::GenerateConfig { output } => {
            ChainConfig::default().save(&output)?;
            if cli.json {
                println!("{}", serde_json::json!({"success": true, "path": output}));
            } else {
                println!("✅ Example chain written to {}", output);
            }
        }
    }

    Ok(())
}

fn load_chain(path: &str) -> anyhow::Result<BlockChain> {
    let config = ChainConfig::load(path)?;
    info!("Building {} blocks from {}", config.blocks.len(), path);
    Ok(config.build()?)
}
