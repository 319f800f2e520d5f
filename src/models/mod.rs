pub mod booking;
pub mod holiday;
pub mod slot;
pub mod snapshot;

pub use booking::{
    Booking, BookingRequest, Package, RequestStatus, RequestedSession, Session, SessionEdit,
    SessionEditRequest,
};
pub use holiday::{Holiday, Therapist};
pub use slot::SlotDefinition;
pub use snapshot::AvailabilitySnapshot;
