//! Domain models shared across crates

pub mod customer;
pub mod driver;
pub mod meal;
pub mod order;
pub mod restaurant;

pub use customer::Customer;
pub use driver::{Driver, GeoPoint};
pub use meal::Meal;
pub use order::{CartLine, Order, OrderItem, OrderStatus};
pub use restaurant::Restaurant;
