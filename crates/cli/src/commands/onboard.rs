//! `dialogbridge onboard`: Write a default config file.

use dialogbridge_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("DialogBridge — First-Time Setup");
    println!("===============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config file exists, leaving it untouched: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Wrote default config: {}", config_path.display());
    }

    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY (or api_key in config.toml, or a .env file)");
    println!("  2. Adjust [assistant] system_prompt and fallback_message");
    println!("  3. Run `dialogbridge gateway` and point the platform's fulfillment URL at it");

    Ok(())
}
