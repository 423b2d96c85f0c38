//! Session middleware configuration and cart persistence.
//!
//! The cart lives in a `PostgreSQL`-backed tower-sessions session as a
//! versioned [`PersistedCart`].

use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::warn;

use audie_boutique_core::{Cart, PersistedCart};

use crate::error::AppError;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "audie_session";

/// Session key holding the cart.
pub const CART_KEY: &str = "cart";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer.
///
/// Production passes a [`PostgresStore`]; tests use the in-memory store.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    secure: bool,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Session store on the Supabase Postgres database.
///
/// The `tower_sessions` schema is created with [`PostgresStore::migrate`].
#[must_use]
pub fn postgres_store(pool: sqlx::PgPool) -> PostgresStore {
    PostgresStore::new(pool)
}

/// Read the cart from the session.
///
/// A missing cart is empty. A stored cart that cannot be read (unknown
/// version, invalid line, wrong shape) is dropped and logged.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, AppError> {
    let persisted = match session.get::<PersistedCart>(CART_KEY).await {
        Ok(Some(persisted)) => persisted,
        Ok(None) => return Ok(Cart::new()),
        Err(tower_sessions::session::Error::SerdeJson(e)) => {
            warn!(error = %e, "discarding unreadable session cart");
            session.remove_value(CART_KEY).await?;
            return Ok(Cart::new());
        }
        Err(e) => return Err(e.into()),
    };

    match Cart::from_persisted(persisted) {
        Ok(cart) => Ok(cart),
        Err(e) => {
            warn!(error = %e, "discarding session cart");
            session.remove_value(CART_KEY).await?;
            Ok(Cart::new())
        }
    }
}

/// Write the cart to the session.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), AppError> {
    session.insert(CART_KEY, cart.to_persisted()).await?;
    Ok(())
}
