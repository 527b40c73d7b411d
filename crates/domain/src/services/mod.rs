//! Domain services spanning several aggregates.

mod dispatcher;

pub use dispatcher::{CourierDispatcher, Dispatcher};
