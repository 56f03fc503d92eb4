//! Integration tests against in-memory application state, plus the
//! PostgreSQL stores when a database is available

pub mod connection_test;
pub mod database_test;
pub mod events_test;
pub mod http_test;
