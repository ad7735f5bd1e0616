pub mod admin;
pub mod auth;
pub mod categories;
pub mod errors;
pub mod expenses;
pub mod middleware;
pub mod reports;
pub mod rest;
pub mod routes;
pub mod state;

pub use middleware::{require_admin, require_auth};
pub use routes::api_router;
