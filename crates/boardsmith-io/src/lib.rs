//! # Boardsmith I/O
//!
//! Reading and writing the portable JSON layout format exchanged with the UI
//! and with files on disk.

pub mod layout;

pub use layout::{ComponentRecord, LayoutDocument, LayoutError};
