pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod limits;
pub mod metrics;
pub mod realtime;
pub mod response;
pub mod routes;
pub mod seed;
pub mod server;
pub mod state;

pub use auth::AuthUser;
pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiQuery};
pub use limits::UserRateLimiter;
pub use metrics::Metrics;
pub use realtime::{AlertHub, ChatHub};
pub use response::ApiResponse;
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;
