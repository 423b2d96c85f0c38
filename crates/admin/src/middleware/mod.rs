//! HTTP middleware and extractors for admin.
//!
//! Staff authenticate with a Supabase access token in the `Authorization`
//! header; see [`auth::RequireStaff`].

pub mod auth;

pub use auth::{AuthRejection, CurrentUser, RequireStaff};
