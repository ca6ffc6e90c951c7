//! Cutlist entity manager.
//!
//! Owns the create/update/read operations over the store and the
//! dimension source adapter that turns either pre-structured cut-piece
//! data or raw OCR text into a uniform dimension list. Endpoints stay
//! thin; all semantics live here.

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{
    default_material, default_stock_piece, CutPiece, Cutlist, CutlistView, Material, StockPiece,
};
use crate::ocr;

#[derive(Debug, Error)]
pub enum CutlistError {
    #[error("{0}")]
    Validation(String),
    #[error("Cutting list not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Inbound payload for `POST /cutlist/from-source`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromSourceRequest {
    /// When present, the request targets an existing entity: update,
    /// never a duplicate create.
    pub cutlist_id: Option<String>,
    pub cutlist_data: Option<CutlistData>,
    pub ocr_text: Option<String>,
    pub phone_number: Option<String>,
    pub sender_name: Option<String>,
}

/// Structured cutlist payload, as sent by the automation platform on
/// creation and by consumers on update. `cutPieces` maps onto the
/// entity's `dimensions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutlistData {
    pub cut_pieces: Option<Vec<CutPiece>>,
    pub stock_pieces: Option<Vec<StockPiece>>,
    pub materials: Option<Vec<Material>>,
    pub unit: Option<String>,
}

/// Uniform output of the dimension source adapter.
struct SourceData {
    raw_text: Option<String>,
    unit: String,
    dimensions: Vec<CutPiece>,
    stock_pieces: Vec<StockPiece>,
    materials: Vec<Material>,
}

/// Select the input variant by presence: structured `cutlistData` wins,
/// then `ocrText` (with default stock/material injection), else a
/// validation failure.
fn resolve_source(req: &FromSourceRequest) -> Result<SourceData, CutlistError> {
    if let Some(data) = &req.cutlist_data {
        return Ok(SourceData {
            raw_text: req.ocr_text.clone(),
            unit: data.unit.clone().unwrap_or_else(|| "mm".to_string()),
            dimensions: data.cut_pieces.clone().unwrap_or_default(),
            stock_pieces: data.stock_pieces.clone().unwrap_or_default(),
            materials: data.materials.clone().unwrap_or_default(),
        });
    }

    if let Some(text) = req.ocr_text.as_deref().filter(|t| !t.trim().is_empty()) {
        // OCR extraction failure is non-fatal: zero dimensions, defaults still apply.
        let extracted = ocr::text::process_ocr_text(text);
        tracing::debug!(
            dimensions = extracted.dimensions.len(),
            unit = %extracted.unit,
            "Extracted dimensions from OCR text"
        );
        return Ok(SourceData {
            raw_text: Some(text.to_string()),
            unit: extracted.unit,
            dimensions: extracted.dimensions,
            stock_pieces: vec![default_stock_piece()],
            materials: vec![default_material()],
        });
    }

    Err(CutlistError::Validation(
        "No cutlist data or OCR text provided".to_string(),
    ))
}

/// Create a cutlist from the messaging-channel creation path.
///
/// Channel-sourced identity (sender name, phone number) always overrides
/// any identity carried inside `cutlistData`: provenance stays with the
/// real sender.
pub fn create_from_source(
    conn: &Connection,
    req: &FromSourceRequest,
) -> Result<Cutlist, CutlistError> {
    // A known identifier means this logical event already produced an
    // entity: take the update path, never a duplicate create.
    if let Some(raw_id) = req.cutlist_id.as_deref().filter(|s| !s.trim().is_empty()) {
        return update_from_source(conn, raw_id, req);
    }

    let source = resolve_source(req)?;

    let cutlist = Cutlist {
        id: Uuid::new_v4(),
        raw_text: source.raw_text,
        unit: source.unit,
        dimensions: source.dimensions,
        stock_pieces: source.stock_pieces,
        materials: source.materials,
        customer_name: req
            .sender_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "WhatsApp User".to_string()),
        project_name: "Cutting List from WhatsApp".to_string(),
        phone_number: req.phone_number.clone().filter(|p| !p.trim().is_empty()),
        created_at: Utc::now(),
    };

    db::insert_cutlist(conn, &cutlist)?;
    tracing::info!(id = %cutlist.id, dimensions = cutlist.dimensions.len(), "Created cutlist");
    Ok(cutlist)
}

/// Re-target a from-source request at an existing entity. Structured
/// data applies as a partial patch; OCR text replaces the dimension
/// list only (existing stock and materials are the customer's edits and
/// stay put).
fn update_from_source(
    conn: &Connection,
    raw_id: &str,
    req: &FromSourceRequest,
) -> Result<Cutlist, CutlistError> {
    let patch = if let Some(data) = &req.cutlist_data {
        data.clone()
    } else if let Some(text) = req.ocr_text.as_deref().filter(|t| !t.trim().is_empty()) {
        CutlistData {
            cut_pieces: Some(ocr::text::process_ocr_text(text).dimensions),
            ..Default::default()
        }
    } else {
        return Err(CutlistError::Validation(
            "No cutlist data or OCR text provided".to_string(),
        ));
    };
    apply_update(conn, raw_id, &patch)
}

/// Create a cutlist from a photographed list processed by the image OCR
/// collaborator (webhook image path).
pub fn create_from_capture(
    conn: &Connection,
    capture: &ocr::ImageOcrResult,
    sender_name: &str,
    phone_number: &str,
) -> Result<Cutlist, CutlistError> {
    let cutlist = Cutlist {
        id: Uuid::new_v4(),
        raw_text: Some(capture.raw_text.clone()),
        unit: capture.unit.clone(),
        dimensions: capture.dimensions.clone(),
        stock_pieces: vec![default_stock_piece()],
        materials: vec![default_material()],
        customer_name: if sender_name.trim().is_empty() {
            "Customer".to_string()
        } else {
            sender_name.to_string()
        },
        project_name: "Cutting List Project".to_string(),
        phone_number: Some(phone_number.to_string()).filter(|p| !p.is_empty()),
        created_at: Utc::now(),
    };

    db::insert_cutlist(conn, &cutlist)?;
    tracing::info!(id = %cutlist.id, dimensions = cutlist.dimensions.len(), "Created cutlist from capture");
    Ok(cutlist)
}

/// Validate an identifier before any store access.
pub fn parse_id(raw: &str) -> Result<Uuid, CutlistError> {
    Uuid::parse_str(raw)
        .map_err(|_| CutlistError::Validation("Invalid cutting list ID".to_string()))
}

pub fn fetch(conn: &Connection, raw_id: &str) -> Result<Cutlist, CutlistError> {
    let id = parse_id(raw_id)?;
    db::get_cutlist(conn, &id)?.ok_or(CutlistError::NotFound)
}

/// Fetch with the consumer-facing `cutPieces` projection.
pub fn fetch_view(conn: &Connection, raw_id: &str) -> Result<CutlistView, CutlistError> {
    Ok(fetch(conn, raw_id)?.to_view())
}

pub fn list_views(conn: &Connection) -> Result<Vec<CutlistView>, CutlistError> {
    Ok(db::list_cutlists(conn)?
        .iter()
        .map(Cutlist::to_view)
        .collect())
}

/// Partial patch at the field level, full replace at the array level:
/// each array present in the patch replaces the stored one wholesale,
/// absent keys leave the stored array untouched.
pub fn apply_update(
    conn: &Connection,
    raw_id: &str,
    patch: &CutlistData,
) -> Result<Cutlist, CutlistError> {
    let mut cutlist = fetch(conn, raw_id)?;

    if let Some(pieces) = &patch.cut_pieces {
        cutlist.dimensions = pieces.clone();
    }
    if let Some(stock) = &patch.stock_pieces {
        cutlist.stock_pieces = stock.clone();
    }
    if let Some(materials) = &patch.materials {
        cutlist.materials = materials.clone();
    }

    db::update_cutlist_arrays(conn, &cutlist)?;
    tracing::info!(id = %cutlist.id, "Updated cutlist");
    Ok(cutlist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn structured_request() -> FromSourceRequest {
        FromSourceRequest {
            cutlist_id: None,
            cutlist_data: Some(CutlistData {
                cut_pieces: Some(vec![CutPiece {
                    id: None,
                    width: 600.0,
                    length: 400.0,
                    quantity: 2,
                }]),
                stock_pieces: None,
                materials: None,
                unit: None,
            }),
            ocr_text: None,
            phone_number: Some("15551234567".to_string()),
            sender_name: Some("Sifo".to_string()),
        }
    }

    #[test]
    fn create_structured_maps_cut_pieces_to_dimensions() {
        let conn = open_memory_database().unwrap();
        let cutlist = create_from_source(&conn, &structured_request()).unwrap();
        assert_eq!(cutlist.dimensions.len(), 1);
        assert_eq!(cutlist.dimensions[0].width, 600.0);
        // No defaults on the structured path
        assert!(cutlist.stock_pieces.is_empty());
        assert!(cutlist.materials.is_empty());
    }

    #[test]
    fn channel_identity_overrides_payload_identity() {
        let conn = open_memory_database().unwrap();
        let cutlist = create_from_source(&conn, &structured_request()).unwrap();
        assert_eq!(cutlist.customer_name, "Sifo");
        assert_eq!(cutlist.phone_number.as_deref(), Some("15551234567"));
        assert_eq!(cutlist.project_name, "Cutting List from WhatsApp");
    }

    #[test]
    fn create_from_ocr_injects_defaults() {
        let conn = open_memory_database().unwrap();
        let req = FromSourceRequest {
            ocr_text: Some("600 x 400 x2\n300 x 200".to_string()),
            ..Default::default()
        };
        let cutlist = create_from_source(&conn, &req).unwrap();
        assert_eq!(cutlist.dimensions.len(), 2);
        assert_eq!(cutlist.stock_pieces.len(), 1);
        assert_eq!(cutlist.stock_pieces[0].quantity, 999);
        assert_eq!(cutlist.materials.len(), 1);
        assert_eq!(cutlist.materials[0].name, "white melamine");
        assert_eq!(cutlist.materials[0].thickness, 16.0);
        assert_eq!(cutlist.customer_name, "WhatsApp User");
    }

    #[test]
    fn create_from_unparseable_ocr_still_succeeds() {
        let conn = open_memory_database().unwrap();
        let req = FromSourceRequest {
            ocr_text: Some("no numbers here at all".to_string()),
            ..Default::default()
        };
        let cutlist = create_from_source(&conn, &req).unwrap();
        assert!(cutlist.dimensions.is_empty());
        // Defaults apply regardless of extraction yield
        assert_eq!(cutlist.stock_pieces.len(), 1);
    }

    #[test]
    fn create_without_source_is_a_validation_error() {
        let conn = open_memory_database().unwrap();
        let err = create_from_source(&conn, &FromSourceRequest::default()).unwrap_err();
        match err {
            CutlistError::Validation(msg) => {
                assert!(msg.contains("No cutlist data or OCR text"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_id_fails_before_store_access() {
        let conn = open_memory_database().unwrap();
        // Drop the table: if fetch touched the store this would be a Store error.
        conn.execute_batch("DROP TABLE cutlists").unwrap();
        let err = fetch(&conn, "not-a-uuid").unwrap_err();
        assert!(matches!(err, CutlistError::Validation(_)));
    }

    #[test]
    fn well_formed_missing_id_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = fetch(&conn, &Uuid::new_v4().to_string()).unwrap_err();
        assert!(matches!(err, CutlistError::NotFound));
    }

    #[test]
    fn update_replaces_present_arrays_only() {
        let conn = open_memory_database().unwrap();
        let req = FromSourceRequest {
            ocr_text: Some("600 x 400".to_string()),
            ..Default::default()
        };
        let created = create_from_source(&conn, &req).unwrap();

        let patch = CutlistData {
            cut_pieces: Some(vec![CutPiece {
                id: None,
                width: 100.0,
                length: 50.0,
                quantity: 3,
            }]),
            ..Default::default()
        };
        let updated = apply_update(&conn, &created.id.to_string(), &patch).unwrap();

        assert_eq!(updated.dimensions.len(), 1);
        assert_eq!(updated.dimensions[0].quantity, 3);
        // Absent keys untouched
        assert_eq!(updated.stock_pieces.len(), 1);
        assert_eq!(updated.materials.len(), 1);
    }

    #[test]
    fn known_identifier_updates_instead_of_creating() {
        let conn = open_memory_database().unwrap();
        let first = create_from_source(&conn, &structured_request()).unwrap();

        let mut req = structured_request();
        req.cutlist_id = Some(first.id.to_string());
        req.cutlist_data = Some(CutlistData {
            cut_pieces: Some(vec![CutPiece {
                id: None,
                width: 900.0,
                length: 100.0,
                quantity: 1,
            }]),
            ..Default::default()
        });
        let second = create_from_source(&conn, &req).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.dimensions[0].width, 900.0);
        assert_eq!(list_views(&conn).unwrap().len(), 1);
    }

    #[test]
    fn known_identifier_with_ocr_text_replaces_dimensions_only() {
        let conn = open_memory_database().unwrap();
        let req = FromSourceRequest {
            ocr_text: Some("600 x 400".to_string()),
            ..Default::default()
        };
        let created = create_from_source(&conn, &req).unwrap();
        let original_stock = created.stock_pieces.clone();

        let update = FromSourceRequest {
            cutlist_id: Some(created.id.to_string()),
            ocr_text: Some("100 x 50 x3\n200 x 80".to_string()),
            ..Default::default()
        };
        let updated = create_from_source(&conn, &update).unwrap();

        assert_eq!(updated.dimensions.len(), 2);
        assert_eq!(updated.stock_pieces, original_stock);
    }

    #[test]
    fn known_identifier_for_missing_entity_is_not_found() {
        let conn = open_memory_database().unwrap();
        let mut req = structured_request();
        req.cutlist_id = Some(Uuid::new_v4().to_string());
        let err = create_from_source(&conn, &req).unwrap_err();
        assert!(matches!(err, CutlistError::NotFound));
    }

    #[test]
    fn round_trip_view_matches_created_dimensions() {
        let conn = open_memory_database().unwrap();
        let created = create_from_source(&conn, &structured_request()).unwrap();
        let view = fetch_view(&conn, &created.id.to_string()).unwrap();
        assert_eq!(view.cut_pieces, created.dimensions);
        assert_eq!(view.cutlist.dimensions, created.dimensions);
    }
}
