//! Core types for Dragonfruit Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod page;
pub mod patch;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use page::{Page, PageRequest, Pagination, ResolvedPage};
pub use patch::Patch;
pub use role::{Role, RoleParseError};
pub use status::*;
