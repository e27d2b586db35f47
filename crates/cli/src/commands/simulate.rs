//! `dialogbridge simulate`: Run one webhook request through the assistant.
//!
//! Reads a request body exactly as the platform would post it and prints
//! the fulfillment JSON the gateway would return.

use std::io::Read;
use std::path::PathBuf;

use dialogbridge_assistant::Orchestrator;
use dialogbridge_config::AppConfig;
use dialogbridge_core::fulfillment::WebhookRequest;

pub async fn run(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let body = if file.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(&file).map_err(|e| format!("Failed to read {}: {e}", file.display()))?
    };

    let router = dialogbridge_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("No provider registered under '{}'", router.default_name()))?;
    let orchestrator = Orchestrator::from_config(provider, &config);

    let response = match WebhookRequest::parse(&body) {
        Ok(request) => orchestrator.handle(&request).await,
        Err(e) => orchestrator.recover(&e),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
