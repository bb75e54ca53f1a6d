pub mod availability;
pub mod booking;
pub mod catalog;
pub mod rate_limiter;
pub mod render;
pub mod slots;

pub use crate::domain::model::{AvailabilityQuery, DaySlots, Service, Slot};
pub use crate::domain::ports::{AvailabilitySource, Mailer, PaymentGateway, Storage};
pub use crate::utils::error::Result;
