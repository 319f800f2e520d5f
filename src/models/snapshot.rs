use serde::{Deserialize, Serialize};

use crate::models::{Booking, Therapist};

/// An in-memory snapshot of the data the availability engine reads:
/// therapists with their holidays, and confirmed bookings with their
/// sessions. Capacity and conflict computations are pure functions over
/// one of these, refreshed by an explicit fetch. The snapshot can go
/// stale between fetch and submit; the engine is advisory and the store
/// write is the final answer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AvailabilitySnapshot {
    pub therapists: Vec<Therapist>,
    pub bookings: Vec<Booking>,
}

impl AvailabilitySnapshot {
    pub fn new(therapists: Vec<Therapist>, bookings: Vec<Booking>) -> Self {
        Self {
            therapists,
            bookings,
        }
    }
}
