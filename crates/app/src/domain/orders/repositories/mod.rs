//! Order Repositories

mod addresses;
mod items;
mod orders;

pub(crate) use addresses::PgAddressesRepository;
pub(crate) use items::{NewOrderLine, PgOrderItemsRepository};
pub(crate) use orders::{PendingOrder, PgOrdersRepository};
