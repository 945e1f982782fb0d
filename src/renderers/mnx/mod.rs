//! MNX emitters
//!
//! Both emitters make one read-only pass over a [`crate::models::Score`]:
//! - `json`: MNX (JSON), sorted keys, 2-space indentation
//! - `common`: MNX-Common (XML)
//!
//! Values with no representation in the target format (e.g. a 3/8 note value)
//! are export errors; nothing is written in that case.

pub mod common;
pub mod json;
pub mod microformat;
