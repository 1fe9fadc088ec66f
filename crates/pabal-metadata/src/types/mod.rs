//! ASO data types.

pub mod apple;
pub mod aso;
pub mod common;
pub mod google_play;
pub mod release_notes;
