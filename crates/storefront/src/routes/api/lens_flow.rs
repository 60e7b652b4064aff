//! Lens & power selection API.
//!
//! The flow state lives in the session under `lens_flow`, so a reload or a
//! second tab resumes the same step. Clients refer to lenses by id; the lens
//! (and its price) is always resolved from the catalogue.
//!
//! ```text
//! GET  /api/lens-flow         - Current step
//! POST /api/lens-flow/start   - {"product_id": 12}
//! POST /api/lens-flow/event   - {"type": "select_lens", "lens_id": 3}
//! ```
//!
//! When a step completes the flow, the selection is added to the cart and the
//! session flow is reset.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use eyeric_core::cart::{CartItem, PowerDetails};
use eyeric_core::lens::{Lens, lenses_of_kind};
use eyeric_core::lens_flow::{LensEvent, LensFlow, LensFlowError, PowerMethod};
use eyeric_core::{LensId, LensKind, ProductId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::session::keys;
use crate::services::CartService;
use crate::state::AppState;
use crate::storage::Bucket;

/// Start request body.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub product_id: ProductId,
}

/// Event request body, mirroring `LensEvent` with lenses by id.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowInput {
    SelectCategory { kind: LensKind },
    SelectLens { lens_id: LensId },
    ChoosePowerMethod { method: PowerMethod },
    SubmitPower { details: PowerDetails },
    SubmitPrescription { url: String },
    Back,
    Cancel,
}

/// Current step plus the options the client needs to render it.
#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub step: &'static str,
    pub flow: LensFlow,
    /// Lens kinds on offer while choosing a category.
    pub kinds: Vec<LensKind>,
    /// Lenses of the chosen kind while choosing a lens.
    pub lenses: Vec<Lens>,
    /// Units in the cart, set once the selection has been added.
    pub cart_count: Option<u32>,
}

impl FlowResponse {
    fn new(flow: LensFlow, offered: &[Lens]) -> Self {
        let kinds = match &flow {
            LensFlow::ChoosingLensCategory { .. } => offered_kinds(offered),
            _ => Vec::new(),
        };
        let lenses = match &flow {
            LensFlow::ChoosingLens { kind, .. } => lenses_of_kind(offered, *kind)
                .into_iter()
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        Self {
            step: flow.step_name(),
            flow,
            kinds,
            lenses,
            cart_count: None,
        }
    }
}

/// Kinds with at least one lens, plus frame-only which needs none.
fn offered_kinds(lenses: &[Lens]) -> Vec<LensKind> {
    LensKind::ALL
        .into_iter()
        .filter(|kind| *kind == LensKind::FrameOnly || lenses.iter().any(|l| l.kind == *kind))
        .collect()
}

/// Current flow state.
#[instrument(skip(state, session))]
pub async fn current(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<FlowResponse>> {
    let flow = load_flow(&session).await?;
    let offered = offered_lenses(&state, &flow).await?;
    Ok(Json(FlowResponse::new(flow, &offered)))
}

/// Begin selecting lenses for a frame, discarding any earlier flow.
#[instrument(skip(state, session, user))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<StartRequest>,
) -> Result<Json<FlowResponse>> {
    let product = state
        .catalog()
        .product(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let flow = LensFlow::Idle.next(LensEvent::Start { product })?;
    advance(&state, &session, user.map(|u| u.id), flow).await
}

/// Apply one event to the session's flow.
#[instrument(skip(state, session, user))]
pub async fn event(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(input): Json<FlowInput>,
) -> Result<Json<FlowResponse>> {
    let flow = load_flow(&session).await?;
    let event = resolve_event(&state, &flow, input).await?;
    let flow = flow.next(event)?;
    advance(&state, &session, user.map(|u| u.id), flow).await
}

/// Turn client input into a domain event.
async fn resolve_event(state: &AppState, flow: &LensFlow, input: FlowInput) -> Result<LensEvent> {
    let event = match input {
        FlowInput::SelectCategory { kind } => LensEvent::SelectCategory { kind },
        FlowInput::SelectLens { lens_id } => {
            let product = flow.product().ok_or(LensFlowError::InvalidTransition {
                state: flow.step_name(),
                event: "select_lens",
            })?;
            let lens = state
                .catalog()
                .lens_for(product, lens_id)
                .await?
                .ok_or(LensFlowError::LensNotOffered)?;
            LensEvent::SelectLens { lens }
        }
        FlowInput::ChoosePowerMethod { method } => LensEvent::ChoosePowerMethod { method },
        FlowInput::SubmitPower { details } => LensEvent::SubmitPower { details },
        FlowInput::SubmitPrescription { url } => {
            if !url.trim().is_empty()
                && !state
                    .storage()
                    .is_public_url(Bucket::PrescriptionImages, url.trim())
            {
                return Err(AppError::BadRequest(
                    "prescription must be uploaded first".to_string(),
                ));
            }
            LensEvent::SubmitPrescription { url }
        }
        FlowInput::Back => LensEvent::Back,
        FlowInput::Cancel => LensEvent::Cancel,
    };
    Ok(event)
}

/// Store the new state, or add a finished selection to the cart.
async fn advance(
    state: &AppState,
    session: &Session,
    user: Option<UserId>,
    flow: LensFlow,
) -> Result<Json<FlowResponse>> {
    if let Some(selection) = flow.selection() {
        let item = CartItem::from(selection.clone());
        let (cart, ()) = CartService::new(state.pool(), session)
            .update(user, |cart| cart.add(item.clone()))
            .await?;
        session.remove::<LensFlow>(keys::LENS_FLOW).await?;

        tracing::info!(
            product_id = %item.product.id,
            power_category = ?item.power_category,
            "Lens selection added to cart"
        );
        let mut response = FlowResponse::new(flow, &[]);
        response.cart_count = Some(cart.count());
        return Ok(Json(response));
    }

    session.insert(keys::LENS_FLOW, &flow).await?;
    let offered = offered_lenses(state, &flow).await?;
    Ok(Json(FlowResponse::new(flow, &offered)))
}

async fn load_flow(session: &Session) -> Result<LensFlow> {
    Ok(session
        .get::<LensFlow>(keys::LENS_FLOW)
        .await?
        .unwrap_or_default())
}

async fn offered_lenses(state: &AppState, flow: &LensFlow) -> Result<Vec<Lens>> {
    match flow.product() {
        Some(product) => Ok(state.catalog().lenses_for(product).await?),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use eyeric_core::LensCategoryId;

    fn lens(id: i32, kind: LensKind) -> Lens {
        Lens {
            id: LensId::new(id),
            title: format!("Lens {id}"),
            description: String::new(),
            features: Vec::new(),
            kind,
            price: Decimal::from(500),
            lens_category_id: LensCategoryId::new(1),
        }
    }

    #[test]
    fn test_offered_kinds_always_include_frame_only() {
        assert_eq!(offered_kinds(&[]), vec![LensKind::FrameOnly]);

        let kinds = offered_kinds(&[lens(1, LensKind::Progressive), lens(2, LensKind::ZeroPower)]);
        assert_eq!(
            kinds,
            vec![LensKind::Progressive, LensKind::ZeroPower, LensKind::FrameOnly]
        );
    }

    #[test]
    fn test_flow_input_uses_lens_ids() {
        let input: FlowInput =
            serde_json::from_str(r#"{"type": "select_lens", "lens_id": 7}"#).unwrap();
        assert!(matches!(input, FlowInput::SelectLens { lens_id } if lens_id == LensId::new(7)));

        let input: FlowInput = serde_json::from_str(
            r#"{"type": "choose_power_method", "method": "submit-later"}"#,
        )
        .unwrap();
        assert!(matches!(
            input,
            FlowInput::ChoosePowerMethod {
                method: PowerMethod::SubmitLater
            }
        ));

        let input: FlowInput =
            serde_json::from_str(r#"{"type": "select_category", "kind": "single vision"}"#).unwrap();
        assert!(matches!(
            input,
            FlowInput::SelectCategory {
                kind: LensKind::SingleVision
            }
        ));
    }

    #[test]
    fn test_idle_response_is_empty() {
        let response = FlowResponse::new(LensFlow::Idle, &[lens(1, LensKind::SingleVision)]);
        assert_eq!(response.step, "idle");
        assert!(response.kinds.is_empty());
        assert!(response.lenses.is_empty());
        assert!(response.cart_count.is_none());
    }
}
