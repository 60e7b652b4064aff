//! Order history for logged-in customers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use eyeric_core::order::Order;
use eyeric_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// One step of the delivery timeline.
#[derive(Clone)]
pub struct TimelineStepView {
    pub label: &'static str,
    pub icon: &'static str,
    pub reached: bool,
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<Order>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub order: Order,
    pub address_lines: Vec<String>,
    pub timeline: Vec<TimelineStepView>,
}

/// List the customer's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(OrdersIndexTemplate { orders })
}

/// Show one of the customer's orders.
///
/// Orders of other customers are reported as missing.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(OrderShowTemplate {
        address_lines: order.shipping_address.lines(),
        timeline: timeline(&order),
        order,
    })
}

fn timeline(order: &Order) -> Vec<TimelineStepView> {
    order
        .timeline()
        .into_iter()
        .map(|(status, reached): (OrderStatus, bool)| TimelineStepView {
            label: status.label(),
            icon: status.icon(),
            reached,
        })
        .collect()
}
