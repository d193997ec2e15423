//! API handlers module

pub mod health;
pub mod notes;
pub mod summarise;
pub mod translate;
