pub mod capacity;
pub mod capacity_defaults;
pub mod conflict;
pub mod lifecycle;
pub mod lock;
pub mod projector;
