use serde::{Deserialize, Serialize};

/// An entry in an establishment's service catalog. Bookings reference a
/// service to derive their duration and total amount; services are never
/// mutated by the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub establishment_id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub category: String,
}
