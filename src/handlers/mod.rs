pub mod admin;
pub mod availability;
pub mod edits;
pub mod health;
pub mod requests;
