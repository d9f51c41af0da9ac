//! Database layer.
//!
//! Uses the repository pattern: each aggregate (users, classes, timetables,
//! fees, ...) has a repository in [`handlers`] that owns its SQL, operating
//! on a `&mut PgConnection` so callers decide transaction boundaries. Data
//! transfer structs live in [`models`]; the API layer never sees raw rows.
//!
//! All tenant-owned tables carry a `tenant_id` column and every query is
//! scoped by it - isolation between schools is enforced here, not in the
//! handlers.

pub mod errors;
pub mod handlers;
pub mod models;
