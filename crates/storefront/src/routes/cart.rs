//! Cart route handlers.
//!
//! The cart is stored in the session. Lines are priced from the catalog when
//! added; the client never supplies a price.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use audie_boutique_core::{Cart, LineItem, Money, ProductId, ShippingMode};

use crate::error::{AppError, Result};
use crate::middleware::{load_cart, save_cart};
use crate::services::Quote;
use crate::state::AppState;

/// One cart line as shown to the customer.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    /// Position of the line; used to update or remove it.
    pub index: usize,
    #[serde(flatten)]
    pub item: LineItem,
    pub line_total: Money,
}

/// Cart contents with their price breakdown.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub quote: Quote,
}

impl CartView {
    fn new(cart: &Cart, quote: Quote) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| CartLineView {
                    index,
                    item: item.clone(),
                    line_total: item.line_total(),
                })
                .collect(),
            quote,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ModeQuery {
    #[serde(default)]
    pub mode: ShippingMode,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteQuery {
    #[serde(default)]
    pub mode: ShippingMode,
    pub promo: Option<String>,
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

fn view(state: &AppState, cart: &Cart, mode: ShippingMode) -> Result<Json<CartView>> {
    let quote = state.checkout().quote(cart, mode, None)?;
    Ok(Json(CartView::new(cart, quote)))
}

/// Show the cart.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ModeQuery>,
) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    view(&state, &cart, query.mode)
}

/// Price breakdown for the cart, optionally with a promo code.
#[instrument(skip(state, session))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<Quote>> {
    let cart = load_cart(&session).await?;
    let quote = state
        .checkout()
        .quote(&cart, query.mode, query.promo.as_deref())?;
    Ok(Json(quote))
}

/// Add a product to the cart, merging with an existing line of the same
/// variant.
#[instrument(skip(state, session), fields(product = %body.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .backends()
        .products
        .fetch_product(body.product_id)
        .await?;
    if !product.is_active {
        return Err(AppError::BadRequest(format!(
            "{} is no longer available",
            product.name
        )));
    }

    let item = LineItem::new(product.id, product.name, product.price, body.quantity)?
        .with_variant(body.color, body.size);

    let mut cart = load_cart(&session).await?;
    cart.add(item)?;
    save_cart(&session, &cart).await?;
    info!(lines = cart.items().len(), "item added to cart");

    view(&state, &cart, ShippingMode::default())
}

/// Change a line's quantity. Zero removes the line.
#[instrument(skip(state, session))]
pub async fn update_item(
    State(state): State<AppState>,
    session: Session,
    Path(index): Path<usize>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(index, body.quantity)?;
    save_cart(&session, &cart).await?;
    view(&state, &cart, ShippingMode::default())
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(index): Path<usize>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(index)?;
    save_cart(&session, &cart).await?;
    view(&state, &cart, ShippingMode::default())
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(StatusCode::NO_CONTENT)
}
