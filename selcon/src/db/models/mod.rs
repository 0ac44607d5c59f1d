//! Database record models matching table schemas.
//!
//! These structs correspond to table rows (or fixed joins over them) and are what repositories
//! return. They are kept separate from the API models in [`crate::api::models`] so storage and
//! wire representations can evolve independently.
//!
//! - [`users`]: student and teacher accounts
//! - [`courses`]: courses and their owning teacher
//! - [`enrollments`]: the student/course ledger, plus the joined views used for listings
//!
//! Database models convert to API models with `From`:
//!
//! ```ignore
//! use selcon::api::models::users::UserResponse;
//!
//! let api_user: UserResponse = db_user.into();
//! ```

pub mod courses;
pub mod enrollments;
pub mod users;
