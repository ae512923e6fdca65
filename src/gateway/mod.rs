//! Gateway construction and the fetch coordinator.

mod builder;
mod coordinator;

pub use builder::{Vedrfolnir, VedrfolnirBuilder};
pub use coordinator::WeatherGateway;
