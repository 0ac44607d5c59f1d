//! Database repository for the enrollment ledger.
//!
//! Enrollment is the one place where concurrent requests compete for the same rows: two students
//! taking the last seat of a course must not both succeed. The seat check and the insert are a
//! single `INSERT ... SELECT ... WHERE count < capacity` statement. Because it is a write, SQLite
//! takes the database write lock before evaluating the count, so no other enroll can interleave
//! between the check and the insert. Callers should issue [`Enrollments::enroll`] as the first
//! statement of their transaction, otherwise a stale read snapshot can make the lock upgrade fail.

use crate::db::{
    errors::{DbError, Result},
    models::enrollments::{CourseEnrollmentDBResponse, EnrollmentDBResponse, StudentEnrollmentDBResponse},
};
use crate::types::{CourseId, UserId, abbrev_uuid};
use chrono::Utc;
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, enrolled_at";

pub struct Enrollments<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Enrollments<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Enroll a student in a course.
    ///
    /// Errors, checked in this order when no row was written:
    /// - [`DbError::NotFound`] if the course does not exist
    /// - [`DbError::UniqueViolation`] on `enrollments` if the student already holds a seat
    /// - [`DbError::CapacityExceeded`] if the course is full
    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id), course_id = %abbrev_uuid(&course_id)), err)]
    pub async fn enroll(&mut self, student_id: UserId, course_id: CourseId) -> Result<EnrollmentDBResponse> {
        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query_as::<_, EnrollmentDBResponse>(&format!(
            "INSERT INTO enrollments (id, student_id, course_id, enrolled_at)
             SELECT ?, ?, c.id, ?
             FROM courses c
             WHERE c.id = ?
               AND (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) < c.capacity
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(Utc::now())
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(enrollment) = inserted {
            tx.commit().await?;
            return Ok(enrollment);
        }

        // Nothing written: work out why while still holding the write lock
        let capacity: Option<i64> = sqlx::query_scalar("SELECT capacity FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(capacity) = capacity else {
            return Err(DbError::NotFound);
        };

        let already_enrolled: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = ? AND course_id = ?)")
            .bind(student_id)
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;

        if already_enrolled {
            return Err(DbError::UniqueViolation {
                constraint: Some("student_id,course_id".to_string()),
                table: Some("enrollments".to_string()),
                message: "student already enrolled in course".to_string(),
            });
        }

        Err(DbError::CapacityExceeded {
            entity_type: "course".to_string(),
            entity_id: course_id.to_string(),
            capacity,
        })
    }

    /// Remove a student's enrollment. [`DbError::NotFound`] if there was none.
    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id), course_id = %abbrev_uuid(&course_id)), err)]
    pub async fn drop(&mut self, student_id: UserId, course_id: CourseId) -> Result<()> {
        let result = sqlx::query("DELETE FROM enrollments WHERE student_id = ? AND course_id = ?")
            .bind(student_id)
            .bind(course_id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// A student's enrollments joined with course and teacher, newest first
    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id)), err)]
    pub async fn list_for_student(&mut self, student_id: UserId) -> Result<Vec<StudentEnrollmentDBResponse>> {
        let rows = sqlx::query_as::<_, StudentEnrollmentDBResponse>(
            "SELECT e.id AS enrollment_id,
                    e.enrolled_at,
                    c.id AS course_id,
                    c.name AS course_name,
                    c.description AS course_description,
                    c.capacity AS course_capacity,
                    t.id AS teacher_id,
                    t.username AS teacher_username
             FROM enrollments e
             JOIN courses c ON c.id = e.course_id
             JOIN users t ON t.id = c.teacher_id
             WHERE e.student_id = ?
             ORDER BY e.enrolled_at DESC, e.rowid DESC",
        )
        .bind(student_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// A course's roster joined with student details, newest first
    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&course_id)), err)]
    pub async fn list_for_course(&mut self, course_id: CourseId) -> Result<Vec<CourseEnrollmentDBResponse>> {
        let rows = sqlx::query_as::<_, CourseEnrollmentDBResponse>(
            "SELECT e.id AS enrollment_id,
                    e.enrolled_at,
                    s.id AS student_id,
                    s.username AS student_username,
                    s.email AS student_email
             FROM enrollments e
             JOIN users s ON s.id = e.student_id
             WHERE e.course_id = ?
             ORDER BY e.enrolled_at DESC, e.rowid DESC",
        )
        .bind(course_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&course_id)), err)]
    pub async fn count_for_course(&mut self, course_id: CourseId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = ?")
            .bind(course_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Enrollment counts for many courses at once. Every requested id is present in the result.
    #[instrument(skip(self, course_ids), fields(count = course_ids.len()), err)]
    pub async fn counts_for_courses(&mut self, course_ids: &[CourseId]) -> Result<HashMap<CourseId, i64>> {
        let mut counts: HashMap<CourseId, i64> = course_ids.iter().map(|id| (*id, 0)).collect();
        if course_ids.is_empty() {
            return Ok(counts);
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT course_id, COUNT(*) FROM enrollments WHERE course_id IN (");
        let mut separated = query.separated(", ");
        for id in course_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") GROUP BY course_id");

        let rows: Vec<(CourseId, i64)> = query.build_query_as().fetch_all(&mut *self.db).await?;
        counts.extend(rows);

        Ok(counts)
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id)), err)]
    pub async fn enrolled_course_ids(&mut self, student_id: UserId) -> Result<HashSet<CourseId>> {
        let ids: Vec<CourseId> = sqlx::query_scalar("SELECT course_id FROM enrollments WHERE student_id = ?")
            .bind(student_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(ids.into_iter().collect())
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id), course_id = %abbrev_uuid(&course_id)), err)]
    pub async fn is_enrolled(&mut self, student_id: UserId, course_id: CourseId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = ? AND course_id = ?)")
            .bind(student_id)
            .bind(course_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }
}
