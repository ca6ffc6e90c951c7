use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::DatabaseError;
use crate::models::{CutPiece, Cutlist, Material, StockPiece};

pub fn insert_cutlist(conn: &Connection, cutlist: &Cutlist) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO cutlists (id, raw_text, unit, dimensions, stock_pieces, materials,
         customer_name, project_name, phone_number, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            cutlist.id.to_string(),
            cutlist.raw_text,
            cutlist.unit,
            to_json_column(&cutlist.dimensions, "dimensions")?,
            to_json_column(&cutlist.stock_pieces, "stock_pieces")?,
            to_json_column(&cutlist.materials, "materials")?,
            cutlist.customer_name,
            cutlist.project_name,
            cutlist.phone_number,
            cutlist.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_cutlist(conn: &Connection, id: &Uuid) -> Result<Option<Cutlist>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, raw_text, unit, dimensions, stock_pieces, materials,
         customer_name, project_name, phone_number, created_at
         FROM cutlists WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], read_row);

    match result {
        Ok(row) => Ok(Some(cutlist_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All cutlists ordered by creation time, newest first.
pub fn list_cutlists(conn: &Connection) -> Result<Vec<Cutlist>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, raw_text, unit, dimensions, stock_pieces, materials,
         customer_name, project_name, phone_number, created_at
         FROM cutlists ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], read_row)?;
    let mut cutlists = Vec::new();
    for row in rows {
        cutlists.push(cutlist_from_row(row?)?);
    }
    Ok(cutlists)
}

/// Persist the mutable array fields (update path: each array is replaced
/// wholesale by the entity manager before this is called).
pub fn update_cutlist_arrays(conn: &Connection, cutlist: &Cutlist) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE cutlists SET dimensions = ?2, stock_pieces = ?3, materials = ?4 WHERE id = ?1",
        params![
            cutlist.id.to_string(),
            to_json_column(&cutlist.dimensions, "dimensions")?,
            to_json_column(&cutlist.stock_pieces, "stock_pieces")?,
            to_json_column(&cutlist.materials, "materials")?,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound(cutlist.id.to_string()));
    }
    Ok(())
}

// Internal row type, mirrors the column order of the SELECTs above.
struct CutlistRow {
    id: String,
    raw_text: Option<String>,
    unit: String,
    dimensions: String,
    stock_pieces: String,
    materials: String,
    customer_name: String,
    project_name: String,
    phone_number: Option<String>,
    created_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CutlistRow> {
    Ok(CutlistRow {
        id: row.get(0)?,
        raw_text: row.get(1)?,
        unit: row.get(2)?,
        dimensions: row.get(3)?,
        stock_pieces: row.get(4)?,
        materials: row.get(5)?,
        customer_name: row.get(6)?,
        project_name: row.get(7)?,
        phone_number: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn cutlist_from_row(row: CutlistRow) -> Result<Cutlist, DatabaseError> {
    Ok(Cutlist {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::CorruptColumn {
            column: "id".to_string(),
            reason: e.to_string(),
        })?,
        raw_text: row.raw_text,
        unit: row.unit,
        dimensions: from_json_column::<Vec<CutPiece>>(&row.dimensions, "dimensions")?,
        stock_pieces: from_json_column::<Vec<StockPiece>>(&row.stock_pieces, "stock_pieces")?,
        materials: from_json_column::<Vec<Material>>(&row.materials, "materials")?,
        customer_name: row.customer_name,
        project_name: row.project_name,
        phone_number: row.phone_number,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DatabaseError::CorruptColumn {
                column: "created_at".to_string(),
                reason: e.to_string(),
            })?,
    })
}

fn to_json_column<T: Serialize>(value: &T, column: &str) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::CorruptColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

fn from_json_column<T: DeserializeOwned>(raw: &str, column: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::CorruptColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}
