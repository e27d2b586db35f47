//! `dialogbridge gateway`: Start the fulfillment webhook server.

use dialogbridge_config::AppConfig;

pub async fn run(
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if config.requires_api_key() && !config.has_api_key() {
        tracing::warn!("No API key configured; every turn will get the fallback reply");
    }

    println!("DialogBridge Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Webhook:   POST {}", config.gateway.webhook_path);
    println!("   Model:     {}/{}", config.default_provider, config.active_model());

    dialogbridge_gateway::start(config).await?;

    Ok(())
}
