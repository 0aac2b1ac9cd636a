use serde_json::json;
use tracing::{info, error};

use crate::error::MonitorResult;

/// Posts `text` to a Slack incoming webhook.
pub async fn send_slack_message(client: &reqwest::Client, webhook_url: &str, text: &str) -> MonitorResult<()> {
    client
        .post(webhook_url)
        .json(&json!({ "text": text }))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

/// Delivers a report summary; failures are logged, never propagated.
pub async fn send_report_summary(webhook_url: &str, symbol: &str, summary: String) {
    let client = reqwest::Client::new();
    match send_slack_message(&client, webhook_url, &summary).await {
        Ok(()) => info!("🚀 Slack summary for {} delivered successfully.", symbol),
        Err(e) => error!("❌ Failed to send Slack summary for {}: {}", symbol, e),
    }
}

/// Short alert when the geometric exit fired on the latest bar.
pub async fn send_exhaustion_alert(webhook_url: &str, symbol: &str, spot: f64, regime: &str) {
    let message = format!(
        "🚨 *Geometric Exhaustion* 🚨\n\
        > *Symbol*: `{}`\n\
        > *Spot*: `${:.2}`\n\
        > *Nearest regime*: {}",
        symbol, spot, regime
    );
    let client = reqwest::Client::new();
    match send_slack_message(&client, webhook_url, &message).await {
        Ok(()) => info!("🔥 Exhaustion alert for {} delivered.", symbol),
        Err(e) => error!("❌ Failed to send exhaustion alert: {}", e),
    }
}
