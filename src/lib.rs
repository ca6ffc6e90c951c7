pub mod api; // HTTP surface: router, endpoints, error mapping
pub mod config;
pub mod cutlists; // Entity manager + dimension source adapter
pub mod db;
pub mod ingest; // Webhook field extraction, phone normalization, background processing
pub mod models;
pub mod notify; // Outbound relay webhook + directed messaging API
pub mod ocr; // OCR collaborator boundary
