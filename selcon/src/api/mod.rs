//! API layer for HTTP request handling and data models.
//!
//! - **[`extract`]**: `Json` and `Path` extractors that reject with [`crate::errors::Error`]
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/register`, `/login`, `/logout`, `/current-user`): accounts and sessions
//! - **Student** (`/student/*`): course catalogue, enrolled courses, enroll and drop
//! - **Teacher** (`/teacher/*`): own courses, course creation and deletion, rosters
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa`. The document is served at
//! `/api-docs/openapi.json` and rendered at `/docs` when the server is running.

pub mod extract;
pub mod handlers;
pub mod models;
