//! `stepwise doctor` — Diagnose configuration and backend health.

use std::path::Path;
use stepwise_config::AppConfig;
use stepwise_core::provider::Provider;

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("Stepwise Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", path.display());
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e:#}");
            anyhow::bail!("1 issue(s) found. See above for details.");
        }
    };

    match stepwise_providers::build_from_config(&config.provider) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Model backend reachable at {}", config.provider.api_url),
            Ok(false) => {
                println!("  ❌ Model backend at {} answered with an error", config.provider.api_url);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Model backend unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Could not create provider: {e}");
            issues += 1;
        }
    }

    let registry = stepwise_tools::registry_from_config(&config.tools);
    println!("  ✅ {} tools registered: {}", registry.names().len(), registry.names().join(", "));

    println!();
    if issues > 0 {
        anyhow::bail!("{issues} issue(s) found. See above for details.");
    }
    println!("  🎉 All checks passed!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_config_fails_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmax_turns = 0\n").unwrap();

        let err = run(Some(&path)).await.unwrap_err();
        assert_eq!(err.to_string(), "1 issue(s) found. See above for details.");
    }

    #[tokio::test]
    async fn unreachable_backend_fails_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider]\napi_url = \"http://127.0.0.1:9\"\n").unwrap();

        let err = run(Some(&path)).await.unwrap_err();
        assert!(err.to_string().starts_with("1 issue(s) found"));
    }
}
