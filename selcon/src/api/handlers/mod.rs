//! HTTP request handlers for all API endpoints.
//!
//! Each handler validates its input, checks the caller's role through its extractor arguments,
//! runs repository calls from [`crate::db::handlers`] and shapes the JSON response.
//!
//! - [`auth`]: registration, login, logout and the current user
//! - [`student`]: catalogue, enrolled courses, enroll and drop
//! - [`teacher`]: own courses, create, delete and roster
//!
//! Handlers return [`crate::errors::Result`], which renders failures as `{"error": "..."}` with
//! the matching status code.

pub mod auth;
pub mod student;
pub mod teacher;
