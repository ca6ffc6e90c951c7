//! Outbound notification dispatch.
//!
//! Two independent channels: a fire-and-forget relay webhook
//! (`relay`) and a directed messaging API call with an alternate-base
//! fallback (`whatsapp`). Both are best-effort: failures come back as a
//! structured result, never as an error the primary operation sees.

pub mod relay;
pub mod whatsapp;

use serde::Serialize;

/// Outcome of one notification attempt, reported to the caller of the
/// creation endpoint (never to the original webhook sender).
#[derive(Debug, Clone, Serialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message: String,
}

impl NotificationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Placeholder before any attempt was made.
    pub fn not_attempted() -> Self {
        Self::failed("WhatsApp message not sent")
    }
}
