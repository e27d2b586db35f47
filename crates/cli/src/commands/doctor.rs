//! `dialogbridge doctor`: Diagnose configuration and provider reachability.

use dialogbridge_config::AppConfig;
use dialogbridge_core::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("DialogBridge Doctor — Diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — defaults in use (run `dialogbridge onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before running other checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else if !config.requires_api_key() {
        println!("  ✅ No API key needed for '{}'", config.default_provider);
    } else {
        println!("  ⚠️  No API key — set OPENAI_API_KEY or api_key in config.toml");
        issues += 1;
    }

    let router = dialogbridge_providers::router::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => {
                println!("  ✅ Provider '{}' reachable", provider.name());
                issues += check_model(provider.as_ref(), config.active_model()).await;
            }
            Ok(false) => {
                println!("  ⚠️  Provider '{}' answered but rejected the request", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        None => {
            println!("  ❌ No provider registered under '{}'", router.default_name());
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Check that the provider lists the configured model. Returns the number of
/// issues found. An empty listing is not an issue; not every backend has one.
async fn check_model(provider: &dyn Provider, model: &str) -> usize {
    match provider.list_models().await {
        Ok(models) if models.is_empty() => 0,
        Ok(models) if models.iter().any(|m| m == model) => {
            println!("  ✅ Model '{model}' available");
            0
        }
        Ok(models) => {
            println!(
                "  ⚠️  Model '{model}' not among the {} listed by '{}'",
                models.len(),
                provider.name()
            );
            1
        }
        Err(e) => {
            println!("  ⚠️  Could not list models: {e}");
            1
        }
    }
}
