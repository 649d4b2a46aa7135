//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use storefront_app::{
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            records::{CartItemRecord, CartItemUuid, CartLine, CartRecord},
        },
        orders::{
            MockOrdersService,
            records::{Address, OrderItemRecord, OrderItemUuid, OrderRecord, OrderUuid},
            status::{OrderStatus, PaymentStatus},
        },
        owners::{OwnerKey, UserUuid},
        payments::MockPaymentsService,
        products::records::{ProductStatus, ProductUuid},
        totals::OrderTotals,
    },
};

use crate::{identity, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());
pub(crate) const TEST_SESSION_ID: &str = "test-session";

pub(crate) fn is_test_user(owner: &OwnerKey) -> bool {
    *owner == OwnerKey::User(TEST_USER_UUID)
}

pub(crate) fn is_test_guest(owner: &OwnerKey) -> bool {
    matches!(owner, OwnerKey::Guest(session) if session.as_str() == TEST_SESSION_ID)
}

fn strict_carts_mock() -> MockCartsService {
    let mut carts = MockCartsService::new();

    carts.expect_get_cart().never();
    carts.expect_add_item().never();
    carts.expect_update_item().never();
    carts.expect_remove_item().never();
    carts.expect_clear_cart().never();
    carts.expect_get_count().never();
    carts.expect_merge_guest_cart().never();

    carts
}

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_create_order().never();
    orders.expect_get_order().never();
    orders.expect_list_orders().never();
    orders.expect_update_status().never();

    orders
}

pub(crate) fn strict_payments_mock() -> MockPaymentsService {
    let mut payments = MockPaymentsService::new();

    payments.expect_initiate_payment().never();
    payments.expect_handle_payment_callback().never();

    payments
}

fn state(
    carts: MockCartsService,
    orders: MockOrdersService,
    payments: MockPaymentsService,
) -> Arc<State> {
    State::from_app_context(AppContext {
        carts: Arc::new(carts),
        orders: Arc::new(orders),
        payments: Arc::new(payments),
    })
}

fn service(state: Arc<State>, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state))
            .hoop(identity::middleware::handler)
            .push(route),
    )
}

pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    service(
        state(carts, strict_orders_mock(), strict_payments_mock()),
        route,
    )
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    service(
        state(strict_carts_mock(), orders, strict_payments_mock()),
        route,
    )
}

pub(crate) fn checkout_service(
    orders: MockOrdersService,
    payments: MockPaymentsService,
    route: Router,
) -> Service {
    service(state(strict_carts_mock(), orders, payments), route)
}

pub(crate) fn payments_service(payments: MockPaymentsService, route: Router) -> Service {
    service(
        state(strict_carts_mock(), strict_orders_mock(), payments),
        route,
    )
}

pub(crate) fn make_cart_item(uuid: CartItemUuid, owner: OwnerKey) -> CartItemRecord {
    CartItemRecord {
        uuid,
        owner,
        product_uuid: ProductUuid::from_uuid(Uuid::nil()),
        quantity: 2,
        unit_price: 12_50,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_cart(owner: OwnerKey) -> CartRecord {
    let item = make_cart_item(CartItemUuid::new(), owner.clone());

    CartRecord {
        owner,
        lines: vec![CartLine {
            item,
            product_name: "Mug".to_string(),
            product_status: ProductStatus::Active,
            current_price: 12_50,
            stock: 10,
            line_total: 25_00,
        }],
        item_count: 2,
        totals: OrderTotals {
            subtotal: 25_00,
            tax_amount: 2_00,
            shipping_amount: 9_99,
            discount_amount: 0,
            total: 36_99,
        },
    }
}

pub(crate) fn make_address() -> Address {
    Address {
        name: "Ada Lovelace".to_string(),
        line1: "12 Analytical Row".to_string(),
        line2: None,
        city: "London".to_string(),
        region: None,
        postal_code: "N1 9GU".to_string(),
        country: "GB".to_string(),
    }
}

pub(crate) fn make_order(uuid: OrderUuid, owner: Option<OwnerKey>) -> OrderRecord {
    OrderRecord {
        uuid,
        order_number: "ORD-20261019-0A1B2C3D".to_string(),
        owner,
        customer_email: "ada@example.com".to_string(),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_session_id: None,
        payment_id: None,
        currency: "USD".to_string(),
        totals: OrderTotals {
            subtotal: 25_00,
            tax_amount: 2_00,
            shipping_amount: 9_99,
            discount_amount: 0,
            total: 36_99,
        },
        billing: make_address(),
        shipping: make_address(),
        items: vec![OrderItemRecord {
            uuid: OrderItemUuid::new(),
            order_uuid: uuid,
            product_uuid: ProductUuid::from_uuid(Uuid::nil()),
            product_name: "Mug".to_string(),
            quantity: 2,
            unit_price: 12_50,
            line_total: 25_00,
        }],
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
