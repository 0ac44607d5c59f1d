//! API request/response models for enrollments and rosters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::enrollments::{CourseEnrollmentDBResponse, EnrollmentDBResponse};
use crate::types::{CourseId, EnrollmentId, UserId};

/// Body of `POST /student/enroll` and `POST /student/drop`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollRequest {
    #[schema(value_type = String, format = "uuid")]
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: EnrollmentId,
    #[schema(value_type = String, format = "uuid")]
    pub student_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
}

impl From<EnrollmentDBResponse> for EnrollmentResponse {
    fn from(db: EnrollmentDBResponse) -> Self {
        Self {
            id: db.id,
            student_id: db.student_id,
            course_id: db.course_id,
            enrolled_at: db.enrolled_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrolledResponse {
    pub message: String,
    pub enrollment: EnrollmentResponse,
}

/// One student on a course roster
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RosterStudent {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
}

impl From<CourseEnrollmentDBResponse> for RosterStudent {
    fn from(db: CourseEnrollmentDBResponse) -> Self {
        Self {
            id: db.student_id,
            username: db.student_username,
            email: db.student_email,
            enrolled_at: db.enrolled_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseId,
    pub name: String,
}

/// Body of `GET /teacher/courses/{id}/students`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseStudentsResponse {
    pub course: CourseSummary,
    pub students: Vec<RosterStudent>,
    pub total: usize,
}
