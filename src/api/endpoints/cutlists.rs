//! Cutlist CRUD endpoints.
//!
//! JSON endpoints answer with a `success` envelope; the browser-facing
//! view answers with HTML (and plain-text errors, since its consumer is
//! a person following a link, not a client parsing JSON).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::cutlists::{self, CutlistData, FromSourceRequest};
use crate::models::Cutlist;
use crate::notify::{relay, NotificationResult};

/// `POST /cutlist/from-source` — create from structured data or OCR text.
///
/// When the request carries a phone number the edit link is relayed to
/// the sender; the relay outcome rides along in the response and never
/// affects the creation status.
pub async fn create_from_source(
    State(ctx): State<ApiContext>,
    Json(req): Json<FromSourceRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let targeting_existing = req
        .cutlist_id
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    let cutlist = {
        let conn = ctx.store()?;
        cutlists::create_from_source(&conn, &req)?
    };

    let notification = match req.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(phone) => {
            relay::send_cutlist_link(&ctx.http, &ctx.config, &cutlist, phone, req.sender_name.as_deref())
                .await
        }
        None => NotificationResult::not_attempted(),
    };

    let (status, message) = if targeting_existing {
        (StatusCode::OK, "Cutlist updated successfully")
    } else {
        (StatusCode::CREATED, "Cutlist created successfully")
    };
    let id = cutlist.id.to_string();
    let body = json!({
        "success": true,
        "message": message,
        "cutlistId": id,
        "editUrl": ctx.config.edit_url(&id),
        "cutlist": cutlist.to_view(),
        "whatsAppNotification": notification,
    });
    Ok((status, Json(body)))
}

/// `GET /cutlist/:id` — browser view of one cutting list.
pub async fn get_html(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Html<String>, (StatusCode, String)> {
    let cutlist = {
        let conn = ctx.store().map_err(html_error)?;
        cutlists::fetch(&conn, &id).map_err(|e| html_error(e.into()))?
    };
    Ok(Html(render_cutlist_page(&cutlist)))
}

/// `GET /cutlist/:id/data` — the same entity as JSON.
pub async fn get_data(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let view = {
        let conn = ctx.store()?;
        cutlists::fetch_view(&conn, &id)?
    };
    Ok(Json(json!({ "success": true, "cutlist": view })))
}

/// `GET /cutlists` — all cutting lists, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Value>, ApiError> {
    let views = {
        let conn = ctx.store()?;
        cutlists::list_views(&conn)?
    };
    Ok(Json(json!({
        "success": true,
        "cutlists": views,
    })))
}

/// Update body: the frontend wraps its patch in `cutlistData`. An
/// absent wrapper is a valid no-op update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub cutlist_data: Option<CutlistData>,
}

/// `PUT /cutlist/:id` — replace whichever arrays the patch carries.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let patch = body.cutlist_data.unwrap_or_default();
    let cutlist = {
        let conn = ctx.store()?;
        cutlists::apply_update(&conn, &id, &patch)?
    };
    Ok(Json(json!({
        "success": true,
        "message": "Cutlist updated successfully",
        "cutlist": cutlist.to_view(),
    })))
}

fn html_error(err: ApiError) -> (StatusCode, String) {
    match err {
        ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        ApiError::NotFound => (StatusCode::NOT_FOUND, "Cutting list not found".to_string()),
        ApiError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

/// Minimal static page: header, dimension table, stock and material
/// summaries. The editable frontend lives elsewhere; this is the
/// read-only link target.
fn render_cutlist_page(cutlist: &Cutlist) -> String {
    let mut rows = String::new();
    for (i, dim) in cutlist.dimensions.iter().enumerate() {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            i + 1,
            dim.width,
            dim.length,
            dim.quantity
        ));
    }

    let materials = cutlist
        .materials
        .iter()
        .map(|m| format!("{} ({}, {}mm)", escape(&m.name), escape(&m.material_type), m.thickness))
        .collect::<Vec<_>>()
        .join(", ");
    let stock = cutlist
        .stock_pieces
        .iter()
        .map(|s| format!("{} x {} (qty {})", s.width, s.length, s.quantity))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Cutting List - {project}</title>\n\
         <style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #ccc;padding:4px 10px}}</style>\n</head>\n<body>\n\
         <h1>{project}</h1>\n\
         <p>Customer: {customer}</p>\n\
         <p>Unit: {unit}</p>\n\
         <table>\n<tr><th>#</th><th>Width</th><th>Length</th><th>Qty</th></tr>\n{rows}\n</table>\n\
         <p>Stock: {stock}</p>\n\
         <p>Materials: {materials}</p>\n\
         </body>\n</html>",
        project = escape(&cutlist.project_name),
        customer = escape(&cutlist.customer_name),
        unit = escape(&cutlist.unit),
        rows = rows,
        stock = stock,
        materials = materials,
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
