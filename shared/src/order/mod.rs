//! Order domain types shared between server and clients

mod types;
mod view;

pub use types::{CancelOrderRequest, CreateOrderRequest, OrderLineInput, OrderStatus};
pub use view::{OrderLineView, OrderView};
