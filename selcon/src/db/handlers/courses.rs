//! Database repository for courses.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::courses::{CourseCreateDBRequest, CourseDBResponse},
};
use crate::types::{CourseId, UserId, abbrev_uuid};
use chrono::Utc;
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing courses
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Only courses owned by this teacher
    pub teacher_id: Option<UserId>,
}

impl CourseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_teacher(teacher_id: UserId) -> Self {
        Self {
            teacher_id: Some(teacher_id),
        }
    }
}

const COURSE_COLUMNS: &str = "id, name, description, teacher_id, capacity, created_at";

pub struct Courses<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Courses<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Courses<'c> {
    type CreateRequest = CourseCreateDBRequest;
    type Response = CourseDBResponse;
    type Id = CourseId;
    type Filter = CourseFilter;

    #[instrument(skip(self, request), fields(teacher_id = %abbrev_uuid(&request.teacher_id), capacity = request.capacity), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let course = sqlx::query_as::<_, CourseDBResponse>(&format!(
            "INSERT INTO courses (id, name, description, teacher_id, capacity, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.teacher_id)
        .bind(request.capacity)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(course)
    }

    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let course = sqlx::query_as::<_, CourseDBResponse>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(course)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<CourseId>) -> Result<HashMap<Self::Id, CourseDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let courses = query.build_query_as::<CourseDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(courses.into_iter().map(|c| (c.id, c)).collect())
    }

    /// Newest first
    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COURSE_COLUMNS} FROM courses"));
        if let Some(teacher_id) = filter.teacher_id {
            query.push(" WHERE teacher_id = ").push_bind(teacher_id);
        }
        query.push(" ORDER BY created_at DESC, rowid DESC");

        let courses = query.build_query_as::<CourseDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(courses)
    }

    /// Removes the course and every enrollment in it. Ownership is checked by the caller.
    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        let dropped = sqlx::query("DELETE FROM enrollments WHERE course_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM courses WHERE id = ?").bind(id).execute(&mut *tx).await?;

        tx.commit().await?;

        if result.rows_affected() > 0 {
            tracing::debug!(enrollments = dropped, "Course deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}
