//! `dialogbridge status`: Show the effective configuration.

use dialogbridge_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = dialogbridge_providers::router::build_from_config(&config);
    let mut providers = router.list();
    providers.sort_unstable();

    println!("DialogBridge Status");
    println!("===================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Registered:   {}", providers.join(", "));
    println!("  Model:        {}", config.active_model());
    println!("  Temperature:  {}", config.default_temperature);
    println!("  Max tokens:   {}", config.default_max_tokens);
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Webhook path: {}", config.gateway.webhook_path);
    let key_state = if config.has_api_key() {
        "set"
    } else if config.requires_api_key() {
        "missing"
    } else {
        "not needed"
    };
    println!("  API key:      {key_state}");
    println!("  Fallback:     {}", config.assistant.fallback_message);

    Ok(())
}
