//! Database models for enrollments.

use crate::types::{CourseId, EnrollmentId, UserId};
use chrono::{DateTime, Utc};

/// A single enrollment row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrollmentDBResponse {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
}

/// An enrollment joined with its course and the course's teacher, as seen by the student
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentEnrollmentDBResponse {
    pub enrollment_id: EnrollmentId,
    pub enrolled_at: DateTime<Utc>,
    pub course_id: CourseId,
    pub course_name: String,
    pub course_description: String,
    pub course_capacity: i64,
    pub teacher_id: UserId,
    pub teacher_username: String,
}

/// An enrollment joined with the enrolled student, as seen by the course owner
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CourseEnrollmentDBResponse {
    pub enrollment_id: EnrollmentId,
    pub enrolled_at: DateTime<Utc>,
    pub student_id: UserId,
    pub student_username: String,
    pub student_email: String,
}
