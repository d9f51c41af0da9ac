//! Shared constructors for tests.

use crate::{config::Config, payments, AppState};
use sqlx::postgres::PgPoolOptions;

/// A valid config with a fixed secret and the dummy payment gateway.
pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key".to_string()),
        ..Default::default()
    }
}

/// App state over a lazy pool: nothing touches the network until a query
/// actually runs, so session/extractor tests work without a database.
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let db = PgPoolOptions::new()
        .connect_lazy("postgresql://localhost/classctl_test")
        .expect("lazy pool construction cannot fail");
    let gateway = payments::create_gateway(&config.payment);

    AppState::builder().db(db).config(config).payments(gateway).build()
}
