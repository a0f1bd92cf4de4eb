mod handlers;
mod routes;

pub use handlers::{AppState, ErrorResponse, SweepResponse};
pub use routes::create_api_router;
