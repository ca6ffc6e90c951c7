pub mod cutlist;

pub use cutlist::*;
