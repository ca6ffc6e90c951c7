//! Process configuration, resolved once at startup.
//!
//! Every value the outbound clients need (base URL, relay webhook,
//! messaging credentials) is read from the environment exactly once and
//! passed explicitly through `ApiContext` — no call-time env lookups.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const APP_NAME: &str = "cutlist-server";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default public base URL for cutlist edit/view links.
const DEFAULT_BASE_URL: &str = "https://hds-sifosmans-projects.vercel.app";
/// Fixed relay webhook that forwards cutlist links into the WhatsApp workflow.
const DEFAULT_RELAY_WEBHOOK_URL: &str =
    "https://www.botsailor.com/webhook/whatsapp-workflow/145613.157394.183999.1748553417";
/// Primary messaging API base.
const DEFAULT_API_BASE: &str = "https://api.botsailor.com/v1";
/// Alternate messaging API base, tried once on connection-level failure.
pub const ALTERNATE_API_BASE: &str = "https://app.botsailor.com/api/v1";

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    /// Public base URL used when building cutlist edit/view links.
    pub base_url: String,
    /// Relay webhook endpoint for cutlist-link notifications.
    pub relay_webhook_url: String,
    /// Messaging API base URL (primary endpoint).
    pub api_base: String,
    /// Alternate messaging API base, tried once when the primary is
    /// unreachable.
    pub alternate_api_base: String,
    /// Bearer token for the messaging API. Absent → directed messages skipped.
    pub api_key: Option<String>,
    /// WhatsApp phone-number channel identifier. Absent → directed messages skipped.
    pub phone_number_id: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_var("BIND_ADDR")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000))),
            database_path: env_var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_data_dir().join("cutlists.db")),
            base_url: env_var("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            relay_webhook_url: env_var("RELAY_WEBHOOK_URL")
                .unwrap_or_else(|| DEFAULT_RELAY_WEBHOOK_URL.to_string()),
            api_base: env_var("BOTSAILOR_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            alternate_api_base: env_var("BOTSAILOR_ALTERNATE_API_URL")
                .unwrap_or_else(|| ALTERNATE_API_BASE.to_string()),
            api_key: env_var("BOTSAILOR_API_KEY"),
            phone_number_id: env_var("WHATSAPP_PHONE_NUMBER_ID"),
        }
    }

    /// Edit link for a cutlist, as sent in notifications.
    pub fn edit_url(&self, id: &str) -> String {
        format!("{}/cutlist-edit/{id}", self.base_url.trim_end_matches('/'))
    }

    /// Web upload fallback link for a sender who could not be processed directly.
    pub fn upload_url(&self, phone: &str) -> String {
        format!(
            "{}/upload?user={}",
            self.base_url.trim_end_matches('/'),
            urlencode(phone)
        )
    }

    /// Configuration suitable for tests: local bind, no credentials.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_path: PathBuf::from(":memory:"),
            base_url: "https://cutlist.test".to_string(),
            relay_webhook_url: "https://relay.invalid/webhook".to_string(),
            api_base: "https://api.invalid/v1".to_string(),
            alternate_api_base: "http://127.0.0.1:1".to_string(),
            api_key: None,
            phone_number_id: None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Application data directory: `~/.cutlist-server/` on all platforms.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cutlist-server")
}

/// Minimal percent-encoding for a query value (phone numbers only contain
/// digits and `+`, which is the one character that must be escaped).
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    out.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    out
}

pub fn default_log_filter() -> &'static str {
    "info,cutlist_server=debug"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_url_joins_without_double_slash() {
        let mut cfg = AppConfig::for_tests();
        cfg.base_url = "https://cutlist.test/".to_string();
        assert_eq!(
            cfg.edit_url("abc-123"),
            "https://cutlist.test/cutlist-edit/abc-123"
        );
    }

    #[test]
    fn upload_url_escapes_plus() {
        let cfg = AppConfig::for_tests();
        assert_eq!(
            cfg.upload_url("+15551234567"),
            "https://cutlist.test/upload?user=%2B15551234567"
        );
    }

    #[test]
    fn default_data_dir_under_home() {
        let dir = default_data_dir();
        assert!(dir.ends_with(".cutlist-server"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
