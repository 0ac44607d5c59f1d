//! Database models for courses.

use crate::types::{CourseId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new course
#[derive(Debug, Clone)]
pub struct CourseCreateDBRequest {
    pub name: String,
    pub description: String,
    pub teacher_id: UserId,
    pub capacity: i64,
}

/// Database response for a course
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CourseDBResponse {
    pub id: CourseId,
    pub name: String,
    pub description: String,
    pub teacher_id: UserId,
    pub capacity: i64,
    pub created_at: DateTime<Utc>,
}
