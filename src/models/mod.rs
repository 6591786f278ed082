pub mod booking;
pub mod payment;
pub mod security_event;
pub mod service;

pub use booking::{Booking, BookingParty, BookingStatus};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use security_event::SecurityEvent;
pub use service::Service;
