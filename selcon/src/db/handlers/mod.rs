//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut SqliteConnection` (a pooled connection or a transaction),
//! binds parameters, and returns records from [`crate::db::models`].
//!
//! - [`Users`]: student and teacher accounts
//! - [`Courses`]: courses and ownership
//! - [`Enrollments`]: the enrollment ledger (seat checks, drops, rosters)
//!
//! [`Users`] and [`Courses`] implement the common [`Repository`] trait. [`Enrollments`] has its
//! own vocabulary (enroll/drop) and does not.
//!
//! ```ignore
//! use selcon::db::handlers::{Courses, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let course = Courses::new(&mut tx).get_by_id(course_id).await?;
//! tx.commit().await?;
//! ```

pub mod courses;
pub mod enrollments;
pub mod repository;
pub mod users;

pub use courses::Courses;
pub use enrollments::Enrollments;
pub use repository::Repository;
pub use users::Users;
