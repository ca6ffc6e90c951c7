//! Cutlist-link relay: POSTs a small fixed payload to the workflow
//! webhook that forwards the edit link into the user's WhatsApp chat.

use std::time::Duration;

use serde::Serialize;

use super::NotificationResult;
use crate::config::AppConfig;
use crate::ingest::phone;
use crate::models::Cutlist;

const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    recipient: String,
    customer_name: &'a str,
    cutlist_url: String,
    dimensions_count: usize,
    project_name: &'a str,
}

/// Send the cutlist edit link through the relay webhook.
///
/// Best-effort: every failure path returns a `NotificationResult` with
/// `success:false`; nothing is thrown upward.
pub async fn send_cutlist_link(
    http: &reqwest::Client,
    config: &AppConfig,
    cutlist: &Cutlist,
    phone_number: &str,
    customer_name: Option<&str>,
) -> NotificationResult {
    let recipient = phone::e164(phone_number);
    if recipient.is_empty() {
        tracing::info!("No phone number provided, skipping cutlist link relay");
        return NotificationResult::failed("No phone number provided");
    }

    let payload = RelayPayload {
        recipient,
        customer_name: customer_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&cutlist.customer_name),
        cutlist_url: config.edit_url(&cutlist.id.to_string()),
        dimensions_count: cutlist.dimensions.len(),
        project_name: &cutlist.project_name,
    };

    tracing::debug!(
        recipient = %payload.recipient,
        dimensions = payload.dimensions_count,
        "Sending cutlist link to relay webhook"
    );

    let result = http
        .post(&config.relay_webhook_url)
        .json(&payload)
        .timeout(RELAY_TIMEOUT)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            tracing::info!(cutlist_id = %cutlist.id, "Cutlist link relayed");
            NotificationResult::ok("WhatsApp message sent successfully")
        }
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "Relay webhook rejected cutlist link");
            NotificationResult::failed(format!("Relay webhook returned {status}"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Error sending cutlist link to relay webhook");
            NotificationResult::failed(format!("Error sending WhatsApp message: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_cutlist() -> Cutlist {
        Cutlist {
            id: Uuid::new_v4(),
            raw_text: None,
            unit: "mm".to_string(),
            dimensions: Vec::new(),
            stock_pieces: Vec::new(),
            materials: Vec::new(),
            customer_name: "Customer".to_string(),
            project_name: "Cutting List Project".to_string(),
            phone_number: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_phone_skips_without_network() {
        let http = reqwest::Client::new();
        let config = AppConfig::for_tests();
        let result =
            send_cutlist_link(&http, &config, &sample_cutlist(), "", None).await;
        assert!(!result.success);
        assert_eq!(result.message, "No phone number provided");
    }

    #[test]
    fn payload_shape_matches_contract() {
        let cutlist = sample_cutlist();
        let payload = RelayPayload {
            recipient: "+15551234567".to_string(),
            customer_name: &cutlist.customer_name,
            cutlist_url: "https://cutlist.test/cutlist-edit/x".to_string(),
            dimensions_count: 3,
            project_name: &cutlist.project_name,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["recipient"], "+15551234567");
        assert_eq!(json["dimensions_count"], 3);
        assert!(json.get("cutlist_url").is_some());
        assert!(json.get("customer_name").is_some());
        assert!(json.get("project_name").is_some());
    }
}
