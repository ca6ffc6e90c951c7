//! Background processing for acknowledged webhook deliveries.
//!
//! The HTTP handler acknowledges immediately; this module does the real
//! work on a detached task. Nothing here can affect the already-sent
//! response, so every failure is logged and swallowed.

use std::io::Write;

use serde_json::Value;

use crate::api::ApiContext;
use crate::cutlists;
use crate::ingest::{extract, phone};
use crate::notify::whatsapp;

const IMAGE_DOWNLOAD_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Process one inbound webhook body end to end: extract fields, run the
/// image through OCR, persist the cutlist, and message the sender.
pub async fn process_webhook(ctx: ApiContext, body: Value) {
    let fields = extract::extract_fields(&body);
    let recipient = phone::dialable(&fields.phone_number);
    tracing::info!(
        user_id = %fields.user_id,
        sender = %fields.sender_name,
        has_image = !fields.image_url.is_empty(),
        "Processing webhook delivery"
    );

    if fields.image_url.is_empty() {
        // No image to work with: point the sender at the web upload page.
        let upload_url = ctx.config.upload_url(&recipient);
        let message = whatsapp::build_upload_fallback_message(&upload_url);
        let result = whatsapp::send_text_message(&ctx.http, &ctx.config, &recipient, &message).await;
        if !result.success {
            tracing::warn!(message = %result.message, "Upload fallback message not sent");
        }
        return;
    }

    let capture = match download_and_ocr(&ctx, &fields.image_url).await {
        Ok(capture) => capture,
        Err(e) => {
            tracing::error!(url = %fields.image_url, error = %e, "Image processing failed");
            let upload_url = ctx.config.upload_url(&recipient);
            let message = whatsapp::build_upload_fallback_message(&upload_url);
            let result =
                whatsapp::send_text_message(&ctx.http, &ctx.config, &recipient, &message).await;
            if !result.success {
                tracing::warn!(message = %result.message, "Upload fallback message not sent");
            }
            return;
        }
    };

    let cutlist = {
        let conn = match ctx.db.lock() {
            Ok(conn) => conn,
            Err(poisoned) => poisoned.into_inner(),
        };
        match cutlists::create_from_capture(&conn, &capture, &fields.sender_name, &recipient) {
            Ok(cutlist) => cutlist,
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist cutlist from webhook image");
                return;
            }
        }
    };

    let edit_url = ctx.config.edit_url(&cutlist.id.to_string());
    let message = whatsapp::build_processed_message(&cutlist, &edit_url);
    let result = whatsapp::send_text_message(&ctx.http, &ctx.config, &recipient, &message).await;
    tracing::info!(
        id = %cutlist.id,
        notified = result.success,
        "Webhook delivery processed"
    );
}

#[derive(Debug, thiserror::Error)]
enum ImageError {
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("download returned {0}")]
    Status(reqwest::StatusCode),
    #[error("cannot spool image: {0}")]
    Spool(#[from] std::io::Error),
    #[error(transparent)]
    Ocr(#[from] crate::ocr::OcrError),
}

/// Download the image to a temp file and hand it to the OCR collaborator.
/// The file is deleted when the handle drops.
async fn download_and_ocr(
    ctx: &ApiContext,
    url: &str,
) -> Result<crate::ocr::ImageOcrResult, ImageError> {
    let response = ctx
        .http
        .get(url)
        .timeout(IMAGE_DOWNLOAD_TIMEOUT)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ImageError::Status(status));
    }
    let bytes = response.bytes().await?;
    tracing::debug!(url, size = bytes.len(), "Image downloaded");

    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&bytes)?;
    file.flush()?;

    Ok(ctx.image_ocr.process_image(file.path())?)
}
