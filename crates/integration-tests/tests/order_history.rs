//! Orders as the history pages present them.

use chrono::Utc;
use rust_decimal::Decimal;

use eyeric_core::cart::{Cart, CartItem};
use eyeric_core::lens_flow::{LensEvent, LensFlow, PowerMethod};
use eyeric_core::order::{Order, OrderItem, OrderTotals, ShippingAddress};
use eyeric_core::{LensKind, OrderId, OrderStatus, PaymentStatus, UserId};
use eyeric_integration_tests::{frame, lens};

fn order_from_cart(cart: &Cart, status: OrderStatus) -> Order {
    let items: Vec<OrderItem> = cart.items().iter().map(OrderItem::from).collect();
    Order {
        id: OrderId::new(1),
        order_number: "EYE-20250101-000001".into(),
        user_id: UserId::new(42),
        shipping_address: ShippingAddress {
            full_name: "Asha Rao".into(),
            address_line1: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
            country: "India".into(),
            ..ShippingAddress::default()
        },
        totals: OrderTotals::from_items(&items),
        items,
        payment_method: Some("UPI".into()),
        payment_status: PaymentStatus::Paid,
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_cart() -> Cart {
    let mut flow = LensFlow::Idle;
    for event in [
        LensEvent::Start {
            product: frame(7, "Round Classic", 1299),
        },
        LensEvent::SelectCategory {
            kind: LensKind::SingleVision,
        },
        LensEvent::SelectLens {
            lens: lens(3, LensKind::SingleVision, 800),
        },
        LensEvent::ChoosePowerMethod {
            method: PowerMethod::SubmitLater,
        },
    ] {
        flow.apply(event).unwrap_or_else(|e| panic!("flow failed: {e}"));
    }

    let mut cart = Cart::new();
    cart.add(CartItem::from(
        flow.into_selection()
            .unwrap_or_else(|| panic!("flow did not finish")),
    ));
    let mut frame_only = CartItem::frame_only(frame(1, "Aviator Gold", 2499));
    frame_only.quantity = 2;
    cart.add(frame_only);
    cart
}

#[test]
fn test_order_snapshot_matches_the_cart() {
    let cart = sample_cart();
    let order = order_from_cart(&cart, OrderStatus::Confirmed);

    assert_eq!(order.item_count(), cart.count());
    assert_eq!(order.totals.total, cart.total());
    assert_eq!(order.totals.subtotal, Decimal::from(2099 + 2499 * 2));
    assert!(order.totals.is_consistent());

    let lensed = &order.items[0];
    assert_eq!(lensed.lens_title.as_deref(), Some("single vision 3"));
    assert_eq!(lensed.line_total(), Decimal::from(2099));
}

#[test]
fn test_timeline_marks_reached_steps() {
    let order = order_from_cart(&sample_cart(), OrderStatus::Shipped);

    assert_eq!(
        order.timeline(),
        vec![
            (OrderStatus::Pending, true),
            (OrderStatus::Confirmed, true),
            (OrderStatus::Processing, true),
            (OrderStatus::Shipped, true),
            (OrderStatus::Delivered, false),
        ]
    );
}

#[test]
fn test_cancelled_and_refunded_orders_have_no_timeline() {
    for status in [OrderStatus::Cancelled, OrderStatus::Refunded] {
        let order = order_from_cart(&sample_cart(), status);
        assert!(order.timeline().is_empty(), "{status} should have no timeline");
        assert!(status.is_terminal());
    }
}

#[test]
fn test_address_lines_skip_blank_parts() {
    let order = order_from_cart(&sample_cart(), OrderStatus::Pending);

    assert_eq!(
        order.shipping_address.lines(),
        vec![
            "Asha Rao",
            "12 MG Road",
            "Bengaluru, Karnataka, 560001",
            "India",
        ]
    );
}

#[test]
fn test_every_status_has_presentation() {
    for status in OrderStatus::ALL {
        assert!(!status.label().is_empty());
        assert!(!status.icon().is_empty());
        assert!(!status.color().is_empty());
        assert!(!status.description().is_empty());
    }
}
