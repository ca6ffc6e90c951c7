//! Canonical cutting-list entity and its API-boundary view.
//!
//! The stored entity keeps cut pieces under `dimensions`; consumers
//! expect the same sequence under `cutPieces`. The alias is a
//! serialization-time projection (`CutlistView`), never a second
//! stored field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock quantity sentinel meaning "unlimited stock".
pub const UNLIMITED_STOCK_QUANTITY: u32 = 999;

/// Default sheet injected on the pure-OCR creation path: 2000×1200, unlimited.
pub const DEFAULT_STOCK_WIDTH: f64 = 2000.0;
pub const DEFAULT_STOCK_LENGTH: f64 = 1200.0;

/// Default material injected on the pure-OCR creation path.
pub const DEFAULT_MATERIAL_NAME: &str = "white melamine";
pub const DEFAULT_MATERIAL_TYPE: &str = "melamine";
pub const DEFAULT_MATERIAL_THICKNESS: f64 = 16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutPiece {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub width: f64,
    pub length: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPiece {
    pub id: String,
    pub width: f64,
    pub length: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub material_type: String,
    pub thickness: f64,
}

/// The canonical persisted entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cutlist {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub unit: String,
    pub dimensions: Vec<CutPiece>,
    pub stock_pieces: Vec<StockPiece>,
    pub materials: Vec<Material>,
    pub customer_name: String,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Cutlist {
    /// Consumer-facing view with the `cutPieces` projection.
    pub fn to_view(&self) -> CutlistView {
        CutlistView {
            cut_pieces: self.dimensions.clone(),
            cutlist: self.clone(),
        }
    }
}

/// Read-time projection: the full entity plus `cutPieces`, which always
/// mirrors `dimensions` in the same order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CutlistView {
    #[serde(flatten)]
    pub cutlist: Cutlist,
    pub cut_pieces: Vec<CutPiece>,
}

/// The default stock piece for cutlists synthesized purely from OCR text.
pub fn default_stock_piece() -> StockPiece {
    StockPiece {
        id: format!("stock-{}", Utc::now().timestamp_millis()),
        width: DEFAULT_STOCK_WIDTH,
        length: DEFAULT_STOCK_LENGTH,
        quantity: UNLIMITED_STOCK_QUANTITY,
    }
}

/// The default material for cutlists synthesized purely from OCR text.
pub fn default_material() -> Material {
    Material {
        id: format!("material-{}", Utc::now().timestamp_millis()),
        name: DEFAULT_MATERIAL_NAME.to_string(),
        material_type: DEFAULT_MATERIAL_TYPE.to_string(),
        thickness: DEFAULT_MATERIAL_THICKNESS,
    }
}
