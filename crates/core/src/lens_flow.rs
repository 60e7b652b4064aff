//! Lens & power selection.
//!
//! Adding a frame that takes lenses walks the customer through up to four
//! steps: lens category, lens, how the power will be supplied, and then
//! either the manual power form or a prescription upload. Each step is a
//! variant of [`LensFlow`] carrying exactly what has been chosen so far, so a
//! prescription upload without a selected lens cannot be represented.
//!
//! ```text
//! Idle ──Start──▶ ChoosingLensCategory ──SelectCategory──▶ ChoosingLens
//!   │                  │ (frame only)                          │ SelectLens
//!   │ (no lenses)      ▼                                       ▼
//!   └────────────▶   Done ◀──(zero power)── ChoosingPowerMethod
//!                     ▲   ◀──(later/saved)──┘   │manual    │upload
//!                     ├── SubmitPower ── EnteringPowerManually
//!                     └── SubmitPrescription ── UploadingPrescription
//! ```
//!
//! `Back` steps to the previous screen, `Cancel` discards everything and
//! `Start` begins again from any state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{CartItem, PowerDetails, PowerError};
use crate::catalog::Product;
use crate::lens::Lens;
use crate::types::{LensKind, PowerCategory};

/// How the customer supplies their power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerMethod {
    Manual,
    Upload,
    SubmitLater,
    Saved,
}

/// Input to the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LensEvent {
    Start { product: Product },
    SelectCategory { kind: LensKind },
    SelectLens { lens: Lens },
    ChoosePowerMethod { method: PowerMethod },
    SubmitPower { details: PowerDetails },
    SubmitPrescription { url: String },
    Back,
    Cancel,
}

impl LensEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::SelectCategory { .. } => "select_category",
            Self::SelectLens { .. } => "select_lens",
            Self::ChoosePowerMethod { .. } => "choose_power_method",
            Self::SubmitPower { .. } => "submit_power",
            Self::SubmitPrescription { .. } => "submit_prescription",
            Self::Back => "back",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LensFlowError {
    #[error("cannot {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
    #[error("lens is {actual}, expected {expected}")]
    WrongLensKind { expected: LensKind, actual: LensKind },
    #[error("lens is not offered for this frame")]
    LensNotOffered,
    #[error("prescription image is missing")]
    MissingPrescription,
    #[error(transparent)]
    InvalidPower(#[from] PowerError),
}

/// Everything chosen by the end of the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensSelection {
    pub product: Product,
    pub lens: Option<Lens>,
    pub power_category: Option<PowerCategory>,
    pub power_details: Option<PowerDetails>,
    pub prescription_image_url: Option<String>,
}

impl LensSelection {
    fn frame_only(product: Product) -> Self {
        Self {
            product,
            lens: None,
            power_category: Some(PowerCategory::FrameOnly),
            power_details: None,
            prescription_image_url: None,
        }
    }

    fn with_lens(product: Product, lens: Lens, power_category: Option<PowerCategory>) -> Self {
        Self {
            product,
            lens: Some(lens),
            power_category,
            power_details: None,
            prescription_image_url: None,
        }
    }
}

impl From<LensSelection> for CartItem {
    fn from(selection: LensSelection) -> Self {
        Self {
            product: selection.product,
            lens: selection.lens,
            power_category: selection.power_category,
            power_details: selection.power_details,
            prescription_image_url: selection.prescription_image_url,
            quantity: 1,
        }
    }
}

/// Current step of the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LensFlow {
    #[default]
    Idle,
    ChoosingLensCategory {
        product: Product,
    },
    ChoosingLens {
        product: Product,
        kind: LensKind,
    },
    ChoosingPowerMethod {
        product: Product,
        lens: Lens,
    },
    EnteringPowerManually {
        product: Product,
        lens: Lens,
    },
    UploadingPrescription {
        product: Product,
        lens: Lens,
    },
    Done {
        selection: LensSelection,
    },
}

impl LensFlow {
    #[must_use]
    pub const fn step_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ChoosingLensCategory { .. } => "choosing lens category",
            Self::ChoosingLens { .. } => "choosing lens",
            Self::ChoosingPowerMethod { .. } => "choosing power method",
            Self::EnteringPowerManually { .. } => "entering power manually",
            Self::UploadingPrescription { .. } => "uploading prescription",
            Self::Done { .. } => "done",
        }
    }

    /// The frame being configured, if any.
    #[must_use]
    pub const fn product(&self) -> Option<&Product> {
        match self {
            Self::Idle => None,
            Self::ChoosingLensCategory { product }
            | Self::ChoosingLens { product, .. }
            | Self::ChoosingPowerMethod { product, .. }
            | Self::EnteringPowerManually { product, .. }
            | Self::UploadingPrescription { product, .. } => Some(product),
            Self::Done { selection } => Some(&selection.product),
        }
    }

    #[must_use]
    pub const fn selection(&self) -> Option<&LensSelection> {
        match self {
            Self::Done { selection } => Some(selection),
            _ => None,
        }
    }

    /// Consume a finished flow.
    #[must_use]
    pub fn into_selection(self) -> Option<LensSelection> {
        match self {
            Self::Done { selection } => Some(selection),
            _ => None,
        }
    }

    /// Compute the state after `event`.
    ///
    /// # Errors
    ///
    /// Returns [`LensFlowError::InvalidTransition`] for events that make no
    /// sense in the current step, and a validation error when the event's
    /// payload is unusable. The current state is left untouched either way.
    pub fn next(&self, event: LensEvent) -> Result<Self, LensFlowError> {
        let invalid = || LensFlowError::InvalidTransition {
            state: self.step_name(),
            event: event.name(),
        };

        let next = match (self, &event) {
            (_, LensEvent::Start { product }) => Self::start(product.clone()),
            (_, LensEvent::Cancel) => Self::Idle,

            (Self::ChoosingLensCategory { product }, LensEvent::SelectCategory { kind }) => {
                match kind {
                    LensKind::FrameOnly => Self::Done {
                        selection: LensSelection::frame_only(product.clone()),
                    },
                    kind => Self::ChoosingLens {
                        product: product.clone(),
                        kind: *kind,
                    },
                }
            }

            (Self::ChoosingLens { product, kind }, LensEvent::SelectLens { lens }) => {
                if lens.kind != *kind {
                    return Err(LensFlowError::WrongLensKind {
                        expected: *kind,
                        actual: lens.kind,
                    });
                }
                if product
                    .lens_category_id
                    .is_some_and(|category| category != lens.lens_category_id)
                {
                    return Err(LensFlowError::LensNotOffered);
                }
                if lens.needs_power() {
                    Self::ChoosingPowerMethod {
                        product: product.clone(),
                        lens: lens.clone(),
                    }
                } else {
                    Self::Done {
                        selection: LensSelection::with_lens(product.clone(), lens.clone(), None),
                    }
                }
            }

            (Self::ChoosingPowerMethod { product, lens }, LensEvent::ChoosePowerMethod { method }) => {
                let (product, lens) = (product.clone(), lens.clone());
                match method {
                    PowerMethod::Manual => Self::EnteringPowerManually { product, lens },
                    PowerMethod::Upload => Self::UploadingPrescription { product, lens },
                    PowerMethod::SubmitLater => Self::Done {
                        selection: LensSelection::with_lens(
                            product,
                            lens,
                            Some(PowerCategory::SubmitLater),
                        ),
                    },
                    PowerMethod::Saved => Self::Done {
                        selection: LensSelection::with_lens(product, lens, Some(PowerCategory::Saved)),
                    },
                }
            }

            (Self::EnteringPowerManually { product, lens }, LensEvent::SubmitPower { details }) => {
                details.validate()?;
                let mut selection =
                    LensSelection::with_lens(product.clone(), lens.clone(), Some(PowerCategory::Manual));
                selection.power_details = Some(details.clone());
                Self::Done { selection }
            }

            (Self::UploadingPrescription { product, lens }, LensEvent::SubmitPrescription { url }) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(LensFlowError::MissingPrescription);
                }
                let mut selection = LensSelection::with_lens(
                    product.clone(),
                    lens.clone(),
                    Some(PowerCategory::Prescription),
                );
                selection.prescription_image_url = Some(url.to_string());
                Self::Done { selection }
            }

            (state, LensEvent::Back) => state.previous().ok_or_else(invalid)?,

            _ => return Err(invalid()),
        };

        Ok(next)
    }

    /// Apply `event` in place. On error the state is unchanged.
    ///
    /// # Errors
    ///
    /// See [`Self::next`].
    pub fn apply(&mut self, event: LensEvent) -> Result<(), LensFlowError> {
        *self = self.next(event)?;
        Ok(())
    }

    fn start(product: Product) -> Self {
        if product.offers_lenses() {
            Self::ChoosingLensCategory { product }
        } else {
            Self::Done {
                selection: LensSelection::frame_only(product),
            }
        }
    }

    fn previous(&self) -> Option<Self> {
        let previous = match self {
            Self::Idle | Self::Done { .. } => return None,
            Self::ChoosingLensCategory { .. } => Self::Idle,
            Self::ChoosingLens { product, .. } => Self::ChoosingLensCategory {
                product: product.clone(),
            },
            Self::ChoosingPowerMethod { product, lens } => Self::ChoosingLens {
                product: product.clone(),
                kind: lens.kind,
            },
            Self::EnteringPowerManually { product, lens }
            | Self::UploadingPrescription { product, lens } => Self::ChoosingPowerMethod {
                product: product.clone(),
                lens: lens.clone(),
            },
        };
        Some(previous)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::frame;
    use crate::lens::fixtures::lens;
    use crate::types::LensCategoryId;

    fn run(events: impl IntoIterator<Item = LensEvent>) -> Result<LensFlow, LensFlowError> {
        let mut flow = LensFlow::Idle;
        for event in events {
            flow.apply(event)?;
        }
        Ok(flow)
    }

    fn start() -> LensEvent {
        LensEvent::Start {
            product: frame(1, 1200),
        }
    }

    fn single_vision() -> Lens {
        lens(10, LensKind::SingleVision, 800)
    }

    #[test]
    fn test_sunglasses_skip_straight_to_frame_only() {
        let mut product = frame(1, 1200);
        product.type_category = vec!["Sunglasses".into()];
        let flow = run([LensEvent::Start { product }]).unwrap();
        let selection = flow.into_selection().unwrap();
        assert_eq!(selection.power_category, Some(PowerCategory::FrameOnly));
        assert!(selection.lens.is_none());
    }

    #[test]
    fn test_frame_only_category() {
        let flow = run([
            start(),
            LensEvent::SelectCategory {
                kind: LensKind::FrameOnly,
            },
        ])
        .unwrap();
        assert_eq!(
            flow.selection().unwrap().power_category,
            Some(PowerCategory::FrameOnly)
        );
    }

    #[test]
    fn test_zero_power_finishes_without_power() {
        let flow = run([
            start(),
            LensEvent::SelectCategory {
                kind: LensKind::ZeroPower,
            },
            LensEvent::SelectLens {
                lens: lens(11, LensKind::ZeroPower, 499),
            },
        ])
        .unwrap();
        let selection = flow.into_selection().unwrap();
        assert_eq!(selection.lens.unwrap().id.as_i32(), 11);
        assert_eq!(selection.power_category, None);
    }

    #[test]
    fn test_manual_power_path() {
        let mut details = PowerDetails::default();
        details.right.sph = "-1.25".into();
        let flow = run([
            start(),
            LensEvent::SelectCategory {
                kind: LensKind::SingleVision,
            },
            LensEvent::SelectLens {
                lens: single_vision(),
            },
            LensEvent::ChoosePowerMethod {
                method: PowerMethod::Manual,
            },
            LensEvent::SubmitPower {
                details: details.clone(),
            },
        ])
        .unwrap();

        let item = CartItem::from(flow.into_selection().unwrap());
        assert_eq!(item.power_category, Some(PowerCategory::Manual));
        assert_eq!(item.power_details, Some(details));
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_invalid_power_keeps_form_open() {
        let mut flow = run([
            start(),
            LensEvent::SelectCategory {
                kind: LensKind::SingleVision,
            },
            LensEvent::SelectLens {
                lens: single_vision(),
            },
            LensEvent::ChoosePowerMethod {
                method: PowerMethod::Manual,
            },
        ])
        .unwrap();

        let err = flow
            .apply(LensEvent::SubmitPower {
                details: PowerDetails::default(),
            })
            .unwrap_err();
        assert_eq!(err, LensFlowError::InvalidPower(PowerError::Empty));
        assert!(matches!(flow, LensFlow::EnteringPowerManually { .. }));
    }

    #[test]
    fn test_upload_and_later_paths() {
        let prefix = [
            start(),
            LensEvent::SelectCategory {
                kind: LensKind::Progressive,
            },
            LensEvent::SelectLens {
                lens: lens(12, LensKind::Progressive, 2400),
            },
        ];

        let uploaded = run(prefix.clone().into_iter().chain([
            LensEvent::ChoosePowerMethod {
                method: PowerMethod::Upload,
            },
            LensEvent::SubmitPrescription {
                url: "https://cdn.example/rx.jpg".into(),
            },
        ]))
        .unwrap();
        let selection = uploaded.into_selection().unwrap();
        assert_eq!(selection.power_category, Some(PowerCategory::Prescription));
        assert_eq!(
            selection.prescription_image_url.as_deref(),
            Some("https://cdn.example/rx.jpg")
        );

        let later = run(prefix.into_iter().chain([LensEvent::ChoosePowerMethod {
            method: PowerMethod::SubmitLater,
        }]))
        .unwrap();
        assert_eq!(
            later.selection().unwrap().power_category,
            Some(PowerCategory::SubmitLater)
        );
    }

    #[test]
    fn test_upload_without_lens_is_rejected() {
        let err = run([
            start(),
            LensEvent::SubmitPrescription {
                url: "https://cdn.example/rx.jpg".into(),
            },
        ])
        .unwrap_err();
        assert_eq!(
            err,
            LensFlowError::InvalidTransition {
                state: "choosing lens category",
                event: "submit_prescription",
            }
        );
    }

    #[test]
    fn test_lens_must_match_kind_and_category() {
        let mut flow = run([
            start(),
            LensEvent::SelectCategory {
                kind: LensKind::SingleVision,
            },
        ])
        .unwrap();
        assert!(matches!(
            flow.next(LensEvent::SelectLens {
                lens: lens(1, LensKind::Progressive, 10)
            }),
            Err(LensFlowError::WrongLensKind { .. })
        ));

        let mut product = frame(2, 1200);
        product.lens_category_id = Some(LensCategoryId::new(9));
        flow = LensFlow::ChoosingLens {
            product,
            kind: LensKind::SingleVision,
        };
        assert_eq!(
            flow.next(LensEvent::SelectLens {
                lens: single_vision()
            }),
            Err(LensFlowError::LensNotOffered)
        );
    }

    #[test]
    fn test_back_and_cancel() {
        let mut flow = run([
            start(),
            LensEvent::SelectCategory {
                kind: LensKind::SingleVision,
            },
            LensEvent::SelectLens {
                lens: single_vision(),
            },
            LensEvent::ChoosePowerMethod {
                method: PowerMethod::Upload,
            },
        ])
        .unwrap();

        flow.apply(LensEvent::Back).unwrap();
        assert!(matches!(flow, LensFlow::ChoosingPowerMethod { .. }));
        flow.apply(LensEvent::Back).unwrap();
        assert!(matches!(
            flow,
            LensFlow::ChoosingLens {
                kind: LensKind::SingleVision,
                ..
            }
        ));
        flow.apply(LensEvent::Cancel).unwrap();
        assert_eq!(flow, LensFlow::Idle);
        assert!(flow.apply(LensEvent::Back).is_err());
    }

    #[test]
    fn test_session_json_round_trip() {
        let flow = run([start()]).unwrap();
        let json = serde_json::to_value(&flow).unwrap();
        assert_eq!(json["step"], "choosing_lens_category");
        let back: LensFlow = serde_json::from_value(json).unwrap();
        assert_eq!(back, flow);
    }

    #[test]
    fn test_event_json_shape() {
        let event: LensEvent =
            serde_json::from_str(r#"{"type": "choose_power_method", "method": "submit-later"}"#)
                .unwrap();
        assert_eq!(
            event,
            LensEvent::ChoosePowerMethod {
                method: PowerMethod::SubmitLater
            }
        );
    }
}
