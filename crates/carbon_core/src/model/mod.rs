//! Domain model for the material catalog and impact calculations.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Keep external field naming (`nome`, `pegada_carbono`, ...) at the serde
//!   boundary while Rust code uses descriptive names.
//!
//! # Invariants
//! - Ownership (`owner_id`) is the only access-control dimension.
//! - Materials are hard-deleted; there is no tombstone state.

pub mod impact;
pub mod material;
pub mod principal;
pub mod project;
