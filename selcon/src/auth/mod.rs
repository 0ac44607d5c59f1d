//! Authentication and authorization.
//!
//! Sessions are stateless: `/login` and `/register` issue an HS256 JWT in an HTTP-only cookie,
//! and every request resolves the caller from that cookie. There is no server-side session map;
//! `/logout` just tells the browser to drop the cookie.
//!
//! # Modules
//!
//! - [`current_user`]: the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor (401 without a valid session)
//! - [`permissions`]: role gates (`RequiresRole<role::Student>`, `RequiresRole<role::Teacher>`) and the course ownership check
//! - [`password`]: Argon2id hashing, run off the async runtime
//! - [`session`]: token claims, signing, verification and the cookie format
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use selcon::api::models::users::CurrentUser;
//!
//! async fn whoami(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
