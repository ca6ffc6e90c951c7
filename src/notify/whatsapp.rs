//! Directed messaging API client.
//!
//! Sends a text message straight to the sender's WhatsApp number through
//! the messaging platform's API. Needs three pieces of configuration
//! (API key, phone-number channel id, recipient); any missing piece
//! skips the send with a log line instead of failing. Connection-level
//! failures get one retry against the alternate API base.

use std::time::Duration;

use serde::Serialize;

use super::NotificationResult;
use crate::config::AppConfig;
use crate::models::Cutlist;

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(15);
/// Dimensions listed in the summary before truncating to "+N more".
const MAX_LISTED_DIMENSIONS: usize = 5;

#[derive(Debug, Serialize)]
struct TextMessagePayload<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextBody<'a>,
    preview_url: bool,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

/// Send a text message to `to` (bare dialable digits).
///
/// Missing configuration is a silent skip (logged, `success:false`).
/// A refused or timed-out connection to the primary endpoint triggers
/// exactly one retry against the alternate base URL.
pub async fn send_text_message(
    http: &reqwest::Client,
    config: &AppConfig,
    to: &str,
    body: &str,
) -> NotificationResult {
    let (Some(api_key), Some(phone_number_id)) = (&config.api_key, &config.phone_number_id) else {
        if config.api_key.is_none() {
            tracing::info!("Missing BOTSAILOR_API_KEY, skipping WhatsApp message");
        }
        if config.phone_number_id.is_none() {
            tracing::info!("Missing WHATSAPP_PHONE_NUMBER_ID, skipping WhatsApp message");
        }
        return NotificationResult::failed("Messaging API not configured");
    };
    if to.is_empty() {
        tracing::info!("Missing recipient phone number, skipping WhatsApp message");
        return NotificationResult::failed("No recipient phone number");
    }

    let payload = TextMessagePayload {
        messaging_product: "whatsapp",
        recipient_type: "individual",
        to,
        message_type: "text",
        text: TextBody { body },
        preview_url: true,
    };

    let endpoint = message_endpoint(&config.api_base, phone_number_id);
    tracing::debug!(%endpoint, to, "Sending WhatsApp message");

    match post_message(http, &endpoint, api_key, &payload).await {
        Ok(()) => NotificationResult::ok("WhatsApp message sent successfully"),
        Err(e) if connection_level(&e) => {
            // Primary endpoint unreachable, one retry against the alternate base.
            let alternate = message_endpoint(&config.alternate_api_base, phone_number_id);
            tracing::warn!(error = %e, %alternate, "Primary messaging endpoint unreachable, retrying");
            match post_message(http, &alternate, api_key, &payload).await {
                Ok(()) => NotificationResult::ok("WhatsApp message sent via alternate endpoint"),
                Err(e) => {
                    tracing::error!(error = %e, "Alternate messaging endpoint failed");
                    NotificationResult::failed(format!("Error sending WhatsApp message: {e}"))
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Messaging API call failed");
            NotificationResult::failed(format!("Error sending WhatsApp message: {e}"))
        }
    }
}

fn message_endpoint(api_base: &str, phone_number_id: &str) -> String {
    format!(
        "{}/whatsapp/{phone_number_id}/messages",
        api_base.trim_end_matches('/')
    )
}

#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("messaging API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

fn connection_level(err: &SendError) -> bool {
    match err {
        SendError::Transport(e) => e.is_connect() || e.is_timeout(),
        SendError::Status { .. } => false,
    }
}

async fn post_message(
    http: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    payload: &TextMessagePayload<'_>,
) -> Result<(), SendError> {
    let response = http
        .post(endpoint)
        .bearer_auth(api_key)
        .json(payload)
        .timeout(MESSAGE_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SendError::Status { status, body });
    }
    tracing::info!(%endpoint, "WhatsApp message sent");
    Ok(())
}

// ── Message builders ────────────────────────────────────────

/// Summary text for a processed cutting list: count, first few
/// dimensions, edit link, tip line.
pub fn build_processed_message(cutlist: &Cutlist, edit_url: &str) -> String {
    let count = cutlist.dimensions.len();
    let mut message = String::from("✅ *Your cutting list has been processed!*\n\n");

    if count > 0 {
        message.push_str(&format!("📏 Found *{count} dimensions* in your image.\n\n"));
        message.push_str(&format!("*Dimensions ({}):*\n", cutlist.unit));
        for (i, dim) in cutlist.dimensions.iter().take(MAX_LISTED_DIMENSIONS).enumerate() {
            message.push_str(&format!("{}. {} x {}", i + 1, dim.width, dim.length));
            if dim.quantity > 1 {
                message.push_str(&format!(" ({}pcs)", dim.quantity));
            }
            message.push('\n');
        }
        if count > MAX_LISTED_DIMENSIONS {
            message.push_str(&format!(
                "... and {} more dimensions.\n",
                count - MAX_LISTED_DIMENSIONS
            ));
        }
    } else {
        message.push_str(
            "⚠️ No dimensions were found in your image. The quality might be too low or the format is not recognized.\n",
        );
    }

    message.push_str(&format!(
        "\n🔗 *View your complete cutting list here:*\n{edit_url}\n\n"
    ));
    message.push_str("You can edit the dimensions and download the cutting list from this link.\n\n");
    message.push_str(
        "💡 *Tip:* Save this link for future reference. You can always come back to view or edit your cutting list.",
    );
    message
}

/// Fallback text pointing the sender at the web upload page when the
/// image could not be processed directly.
pub fn build_upload_fallback_message(upload_url: &str) -> String {
    format!(
        "📷 I received your image, but I'm having trouble processing it directly.\n\n\
         🔗 Please use this link to upload your cutting list image via our web interface:\n{upload_url}\n\n\
         This is a temporary solution while we fix the direct WhatsApp image processing."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CutPiece;
    use chrono::Utc;
    use uuid::Uuid;

    fn cutlist_with(n: usize) -> Cutlist {
        Cutlist {
            id: Uuid::new_v4(),
            raw_text: None,
            unit: "mm".to_string(),
            dimensions: (0..n)
                .map(|i| CutPiece {
                    id: None,
                    width: 100.0 + i as f64,
                    length: 50.0,
                    quantity: if i == 0 { 2 } else { 1 },
                })
                .collect(),
            stock_pieces: Vec::new(),
            materials: Vec::new(),
            customer_name: "Customer".to_string(),
            project_name: "Cutting List Project".to_string(),
            phone_number: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_config_skips_without_network() {
        let http = reqwest::Client::new();
        let config = AppConfig::for_tests();
        let result = send_text_message(&http, &config, "15551234567", "hello").await;
        assert!(!result.success);
        assert_eq!(result.message, "Messaging API not configured");
    }

    #[tokio::test]
    async fn missing_recipient_skips_without_network() {
        let http = reqwest::Client::new();
        let mut config = AppConfig::for_tests();
        config.api_key = Some("key".to_string());
        config.phone_number_id = Some("chan-1".to_string());
        let result = send_text_message(&http, &config, "", "hello").await;
        assert!(!result.success);
        assert_eq!(result.message, "No recipient phone number");
    }

    #[tokio::test]
    async fn refused_primary_retries_alternate_base_once() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // The alternate endpoint is a real local listener; the primary
        // is a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf).await;
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                .await
                .unwrap();
        });

        let mut config = AppConfig::for_tests();
        config.api_key = Some("key".to_string());
        config.phone_number_id = Some("chan-1".to_string());
        config.api_base = "http://127.0.0.1:1".to_string();
        config.alternate_api_base = format!("http://{addr}");

        let http = reqwest::Client::new();
        let result = send_text_message(&http, &config, "15551234567", "hello").await;
        assert!(result.success);
        assert_eq!(result.message, "WhatsApp message sent via alternate endpoint");
        served.await.unwrap();
    }

    #[tokio::test]
    async fn refused_alternate_reports_failure() {
        let mut config = AppConfig::for_tests();
        config.api_key = Some("key".to_string());
        config.phone_number_id = Some("chan-1".to_string());
        config.api_base = "http://127.0.0.1:1".to_string();
        // for_tests() already points the alternate at a refused local port

        let http = reqwest::Client::new();
        let result = send_text_message(&http, &config, "15551234567", "hello").await;
        assert!(!result.success);
        assert!(result.message.starts_with("Error sending WhatsApp message"));
    }

    #[test]
    fn endpoint_joins_channel_id() {
        assert_eq!(
            message_endpoint("https://api.botsailor.com/v1/", "123"),
            "https://api.botsailor.com/v1/whatsapp/123/messages"
        );
    }

    #[test]
    fn payload_shape_matches_contract() {
        let payload = TextMessagePayload {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: "15551234567",
            message_type: "text",
            text: TextBody { body: "hi" },
            preview_url: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["messaging_product"], "whatsapp");
        assert_eq!(json["recipient_type"], "individual");
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["body"], "hi");
        assert_eq!(json["preview_url"], true);
    }

    #[test]
    fn summary_truncates_after_five() {
        let message = build_processed_message(&cutlist_with(8), "https://x/edit");
        assert!(message.contains("Found *8 dimensions*"));
        assert!(message.contains("... and 3 more dimensions."));
        assert!(message.contains("1. 100 x 50 (2pcs)"));
        assert!(!message.contains("6. "));
        assert!(message.contains("https://x/edit"));
    }

    #[test]
    fn summary_without_dimensions_warns() {
        let message = build_processed_message(&cutlist_with(0), "https://x/edit");
        assert!(message.contains("No dimensions were found"));
        assert!(message.contains("https://x/edit"));
    }

    #[test]
    fn upload_fallback_carries_link() {
        let message = build_upload_fallback_message("https://x/upload?user=1");
        assert!(message.contains("https://x/upload?user=1"));
        assert!(message.contains("web interface"));
    }
}
