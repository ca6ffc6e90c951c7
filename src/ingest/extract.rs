//! Best-effort field extraction from arbitrary webhook payloads.
//!
//! The automation platform does not commit to a payload shape, so each
//! output field is resolved against an ordered fallback table of paths
//! (first present match wins). Extraction never fails: every field gets
//! a defined value, generated or literal, when the payload carries none.

use serde_json::Value;

/// Literal fallback when no phone number can be found anywhere.
pub const FALLBACK_PHONE_NUMBER: &str = "12025550108";
/// Question label that marks the image answer in `user_input_data`.
const IMAGE_QUESTION: &str = "Do you have an image?";

/// One step in a fallback path.
#[derive(Debug, Clone, Copy)]
pub enum PathSeg {
    Key(&'static str),
    Index(usize),
}

use PathSeg::{Index, Key};

/// Priority tables, first present match wins.
const WHATSAPP_ID_PATHS: &[&[PathSeg]] = &[
    &[Key("conversation_id")],
    &[Key("whatsapp_id")],
    &[Key("chat_id")],
    &[Key("id")],
];

const USER_ID_PATHS: &[&[PathSeg]] = &[&[Key("user_id")], &[Key("from")]];

const PHONE_NUMBER_PATHS: &[&[PathSeg]] = &[
    &[Key("phone_number")],
    &[Key("sender"), Key("phone_number")],
    &[Key("from")],
    &[Key("customer"), Key("waId")],
    &[Key("messages"), Index(0), Key("from")],
];

const SENDER_NAME_PATHS: &[&[PathSeg]] = &[
    &[Key("sender_name")],
    &[Key("sender"), Key("name")],
    &[Key("customer"), Key("name")],
];

/// Identity and content fields pulled out of one inbound webhook body.
/// Every field is defined; absence degrades to a generated or literal
/// default, never to a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub user_id: String,
    pub phone_number: String,
    pub sender_name: String,
    pub whatsapp_id: String,
    pub image_url: String,
}

/// Resolve all fields against their fallback tables.
pub fn extract_fields(body: &Value) -> ExtractedFields {
    ExtractedFields {
        user_id: first_string(body, USER_ID_PATHS)
            .unwrap_or_else(|| format!("user-{}", chrono::Utc::now().timestamp_millis())),
        phone_number: first_string(body, PHONE_NUMBER_PATHS)
            .unwrap_or_else(|| FALLBACK_PHONE_NUMBER.to_string()),
        sender_name: first_string(body, SENDER_NAME_PATHS)
            .unwrap_or_else(|| "WhatsApp User".to_string()),
        whatsapp_id: first_string(body, WHATSAPP_ID_PATHS).unwrap_or_default(),
        image_url: find_image_url(body).unwrap_or_default(),
    }
}

/// First non-empty string produced by any path in the table.
fn first_string(body: &Value, table: &[&[PathSeg]]) -> Option<String> {
    table.iter().find_map(|path| {
        lookup(body, path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn lookup<'a>(body: &'a Value, path: &[PathSeg]) -> Option<&'a Value> {
    let mut current = body;
    for seg in path {
        current = match seg {
            Key(k) => current.get(k)?,
            Index(i) => current.get(i)?,
        };
    }
    Some(current)
}

/// Scan `user_input_data` for the image question whose answer is an
/// http(s) URL. The first matching entry wins; others are ignored.
fn find_image_url(body: &Value) -> Option<String> {
    let entries = body.get("user_input_data")?.as_array()?;
    entries.iter().find_map(|entry| {
        let question = entry.get("question")?.as_str()?;
        let answer = entry.get("answer")?.as_str()?;
        if question == IMAGE_QUESTION
            && (answer.starts_with("http://") || answer.starts_with("https://"))
        {
            Some(answer.to_string())
        } else {
            None
        }
    })
}
