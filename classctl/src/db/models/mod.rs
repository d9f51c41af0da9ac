//! Data transfer structs between the repositories and the API layer.

pub mod academics;
pub mod assessments;
pub mod classroom;
pub mod fees;
pub mod subscriptions;
pub mod tenants;
pub mod users;
