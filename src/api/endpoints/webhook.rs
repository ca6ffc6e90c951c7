//! Webhook intake — automation platform → cutlist pipeline.
//!
//! `POST /webhook/whatsapp` acknowledges before any work happens: the
//! platform only needs delivery confirmation, and extraction, OCR, and
//! persistence run on a detached task whose failures never reach the
//! sender.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::cutlists;
use crate::ingest::{phone, process};
use crate::notify::relay;

/// `POST /webhook/whatsapp` — accept a delivery and ack immediately.
pub async fn receive(State(ctx): State<ApiContext>, Json(body): Json<Value>) -> Json<Value> {
    tracing::info!("Webhook delivery received");
    tracing::debug!(body = %body, "Webhook body");

    tokio::spawn(process::process_webhook(ctx, body));

    Json(json!({
        "status": "success",
        "message": "Webhook received, processing request",
    }))
}

/// `OPTIONS /webhook/whatsapp` — CORS preflight for the platform's probe.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCutlistRequest {
    pub cutlist_id: Option<String>,
    pub phone_number: Option<String>,
    pub customer_name: Option<String>,
}

/// `POST /whatsapp/send-cutlist` — relay an existing cutlist's edit link
/// to a WhatsApp number on demand.
pub async fn send_cutlist(
    State(ctx): State<ApiContext>,
    Json(req): Json<SendCutlistRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(id), Some(phone_number)) = (
        req.cutlist_id.as_deref().filter(|s| !s.trim().is_empty()),
        req.phone_number.as_deref().filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing required parameters: cutlistId or phoneNumber".to_string(),
        ));
    };

    let cutlist = {
        let conn = ctx.store()?;
        cutlists::fetch(&conn, id)?
    };

    let result = relay::send_cutlist_link(
        &ctx.http,
        &ctx.config,
        &cutlist,
        phone_number,
        req.customer_name.as_deref(),
    )
    .await;
    if !result.success {
        return Err(ApiError::Internal(result.message));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Cutlist link sent to WhatsApp successfully",
        "data": {
            "phoneNumber": phone::e164(phone_number),
            "cutlistUrl": ctx.config.edit_url(&cutlist.id.to_string()),
        },
    })))
}
