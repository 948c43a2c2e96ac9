//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, FederationConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    anti_affinity_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    backends: Vec<BackendInfo>,
}

#[derive(Serialize)]
struct BackendInfo {
    index: usize,
    name: String,
    fixture: String,
    fixture_exists: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &FederationConfig) -> ConfigInfo {
    ConfigInfo {
        anti_affinity_ms: config.anti_affinity_ms,
        timeout_ms: config.timeout_ms,
        backends: config
            .backends
            .iter()
            .enumerate()
            .map(|(index, b)| BackendInfo {
                index,
                name: b.name.clone(),
                fixture: b.fixture.clone(),
                fixture_exists: b.fixture_path().exists(),
            })
            .collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  promfed Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Merge Settings");
    println!("   ├─ Anti-affinity: {}ms", info.anti_affinity_ms);
    match info.timeout_ms {
        Some(ms) if ms > 0 => println!("   └─ Timeout: {}ms", ms),
        _ => println!("   └─ Timeout: none"),
    }

    println!("\n🗄  Backends ({})", info.backends.len());
    for (i, backend) in info.backends.iter().enumerate() {
        let prefix = if i == info.backends.len() - 1 { "└─" } else { "├─" };
        let marker = if backend.fixture_exists { "" } else { " (missing)" };
        println!(
            "   {} [{}] {} → {}{}",
            prefix, backend.index, backend.name, backend.fixture, marker
        );
    }

    println!();
}
