pub mod cutlists;
pub mod webhook;
