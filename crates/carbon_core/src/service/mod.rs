//! Core use-case services.
//!
//! # Responsibility
//! - Apply catalog access rules on top of repository contracts.
//! - Aggregate environmental impact for line items.
//! - Keep callers (CLI, HTTP adapters) decoupled from storage details.

pub mod catalog_service;
pub mod impact;
pub mod project_service;
