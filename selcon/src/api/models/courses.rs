//! API request/response models for courses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::courses::CourseDBResponse;
use crate::types::{CourseId, UserId};

/// Body of `POST /teacher/courses/create`
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CourseCreate {
    pub name: Option<String>,
    /// Defaults to ""
    pub description: Option<String>,
    /// Defaults to `courses.default_capacity`
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseId,
    pub name: String,
    pub description: String,
    pub capacity: i64,
    #[schema(value_type = String, format = "uuid")]
    pub teacher_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<CourseDBResponse> for CourseResponse {
    fn from(db: CourseDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            capacity: db.capacity,
            teacher_id: db.teacher_id,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseCreatedResponse {
    pub message: String,
    pub course: CourseResponse,
}

/// A course in the student catalogue
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentCourseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseId,
    pub name: String,
    pub description: String,
    /// Username of the owning teacher
    pub teacher: String,
    pub capacity: i64,
    pub enrolled: i64,
    pub is_full: bool,
    /// Whether the caller already holds a seat
    pub is_enrolled: bool,
}

/// A course the student is enrolled in
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyCourseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseId,
    pub name: String,
    pub description: String,
    pub teacher: String,
    pub capacity: i64,
    pub enrolled: i64,
    pub is_full: bool,
    pub enrolled_at: DateTime<Utc>,
}

/// A course as listed for its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherCourseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseId,
    pub name: String,
    pub description: String,
    pub capacity: i64,
    pub enrolled: i64,
    pub is_full: bool,
    pub created_at: DateTime<Utc>,
}

impl TeacherCourseResponse {
    pub fn new(course: CourseDBResponse, enrolled: i64) -> Self {
        Self {
            id: course.id,
            is_full: enrolled >= course.capacity,
            name: course.name,
            description: course.description,
            capacity: course.capacity,
            enrolled,
            created_at: course.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentCourseListResponse {
    pub courses: Vec<StudentCourseResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MyCourseListResponse {
    pub courses: Vec<MyCourseResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeacherCourseListResponse {
    pub courses: Vec<TeacherCourseResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_is_full_at_capacity() {
        let course = CourseDBResponse {
            id: Uuid::new_v4(),
            name: "Compilers".to_string(),
            description: String::new(),
            teacher_id: Uuid::new_v4(),
            capacity: 2,
            created_at: Utc::now(),
        };

        assert!(!TeacherCourseResponse::new(course.clone(), 1).is_full);
        assert!(TeacherCourseResponse::new(course, 2).is_full);
    }

    #[test]
    fn test_course_create_fields_are_optional() {
        let create: CourseCreate = serde_json::from_str(r#"{"name": "Compilers"}"#).unwrap();
        assert_eq!(create.name.as_deref(), Some("Compilers"));
        assert!(create.description.is_none());
        assert!(create.capacity.is_none());
    }
}
