//! Inbound webhook ingestion: schema-sniffing field extraction, phone
//! normalization, and the detached processing task that runs after the
//! intake endpoint has already acknowledged the sender.

pub mod extract;
pub mod phone;
pub mod process;
