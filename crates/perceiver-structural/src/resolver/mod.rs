//! Element description and natural-language resolution.
//!
//! `generate` derives the selector and text carried by a descriptor, `rank`
//! holds the deterministic match cascade, and `model` builds the prompt for and
//! validates replies from an optional text model.

pub mod generate;
pub mod model;
pub mod rank;
