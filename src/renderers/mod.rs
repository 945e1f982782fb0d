//! Renderers module for the converter
//!
//! This module contains the export logic that turns a read score into
//! output documents.

pub mod mnx;
