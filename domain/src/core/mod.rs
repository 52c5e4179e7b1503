//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`text::preview`]: single-line previews for log fields

pub mod error;
pub mod text;
