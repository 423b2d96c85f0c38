//! Audie Boutique Supabase - Data access to the hosted backend.
//!
//! The shop runs on a hosted Supabase project. This crate is the only place
//! that talks to it:
//!
//! - [`db`] - sqlx repositories over the project's Postgres database, plus
//!   [`PgStore`], which implements the core storage ports
//! - [`auth`] - Access token verification against GoTrue
//! - [`functions`] - Edge function calls (push notifications, invoices)
//!
//! Rows and payloads are parsed into `audie_boutique_core` types here; a
//! malformed row surfaces as `StoreError::Malformed` and is never passed on.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod client;
pub mod db;
pub mod functions;

pub use auth::{AuthError, AuthenticatedUser};
pub use client::{SupabaseClient, SupabaseConfig, SupabaseError};
pub use db::{PgStore, RepositoryError, create_pool};
pub use functions::EdgeFunctions;
