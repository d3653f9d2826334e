//! REST API endpoint implementations.

mod apps;
mod auth;
mod indexes;
mod request;
pub mod search;
mod server;

pub use apps::list_apps;
pub use auth::login;
pub use indexes::{get_index, list_indexes};
pub use request::send_request_with_retry;
pub use search::{create_job, get_job_status, get_results, wait_for_job};
pub use server::{get_health, get_server_info};
