//! API request/response models, grouped by domain area.

pub mod academics;
pub mod assessments;
pub mod auth;
pub mod classroom;
pub mod fees;
pub mod subscriptions;
pub mod tenants;
pub mod timetables;
pub mod users;
