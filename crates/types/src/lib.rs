#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Hive Types
//!
//! This crate is the foundational library for the Hive control plane,
//! containing the error catalogue, IAM entity records, policy documents,
//! AWS wire shapes, and shared configuration objects.
//!
//! ## Architectural Role
//!
//! As the base crate, `hive-types` depends only on `hive-codec` (for the
//! shape macro) and is itself a dependency for almost every other crate in
//! the workspace. This structure prevents circular dependencies and gives
//! a single canonical definition of shared types like [`error::ApiError`],
//! [`iam::UserRecord`], and the per-action input/output shapes.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::ApiError> = std::result::Result<T, E>;

/// AWS wire shapes for every dispatched action, grouped by service.
pub mod api;
/// Shared configuration structures loaded from the gateway's TOML file.
pub mod config;
/// The closed error catalogue: stable code strings, HTTP statuses, messages.
pub mod error;
/// IAM entity records and the policy-document model.
pub mod iam;
