//! HTTP REST API endpoints.
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/blogpost/` | GET, POST | List / create blog posts |
//! | `/blogpost/count/` | GET | Count blog posts |
//! | `/blogpost/paginated/` | GET | One window of blog posts |
//! | `/blogpost/search/` | GET | Unfiltered search |
//! | `/blogpost/bulk/` | POST, DELETE | Bulk create / bulk delete |
//! | `/blogpost/{id}/` | GET, PUT, DELETE | Single blog post |
//! | `/blogpost/methods/{method}/` | POST | Invoke a registered method |
//! | `/comment/...` | | Same set for comments |
//! | `/`, `/health`, `/ready`, `/statistics`, `/metrics` | GET | System |

mod blogpost;
mod comment;
pub mod extract;
pub mod routes;
pub mod state;

pub use extract::{ApiPath, ApiQuery, JsonBadRequest};
pub use routes::{
    create_router, create_router_with_observability, create_router_with_options, RouterOptions,
    DEFAULT_BODY_LIMIT, DEFAULT_REQUEST_TIMEOUT,
};
pub use state::AppState;

#[cfg(test)]
mod tests;
