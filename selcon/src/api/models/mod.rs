//! API request and response data models.
//!
//! These structures define the public JSON contract. They are distinct from the database records
//! in [`crate::db::models`] and are annotated with `utoipa` for the generated OpenAPI document.
//!
//! - [`auth`]: registration, login and session payloads
//! - [`users`]: roles, user profiles and the authenticated caller
//! - [`courses`]: course creation and the student/teacher course listings
//! - [`enrollments`]: enroll/drop payloads and course rosters

pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod users;
