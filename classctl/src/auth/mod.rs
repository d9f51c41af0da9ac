//! Authentication and authorization.
//!
//! Session-based authentication with a JWT stored in a secure HTTP-only
//! cookie. Users log in via `accounts/login/` with username/password; the
//! cookie is cleared on logout. There is no refresh machinery: an expired
//! session is simply absent and the client re-authenticates.
//!
//! Authorization is a chain of extractors (see [`current_user`]):
//! session -> role guard -> subscription gate. The gate reads subscription
//! state from the database per request, so a revoked subscription takes
//! effect on the next request rather than at the next login.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated user, roles and the
//!   subscription gate
//! - [`password`]: Argon2 hashing for passwords and OTP codes
//! - [`session`]: JWT session token creation and cookie handling

pub mod current_user;
pub mod password;
pub mod session;
