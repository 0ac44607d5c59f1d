use std::collections::HashMap;

use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    api::extract::Json,
    api::models::{
        auth::MessageResponse,
        courses::{MyCourseListResponse, MyCourseResponse, StudentCourseListResponse, StudentCourseResponse},
        enrollments::{EnrollRequest, EnrolledResponse, EnrollmentResponse},
    },
    auth::permissions::{RequiresRole, role},
    db::{
        errors::DbError,
        handlers::{Courses, Enrollments, Repository, Users, courses::CourseFilter},
    },
    errors::{Error, Result},
    types::{CourseId, UserId},
};

/// Usernames for a set of teacher ids
async fn teacher_names(conn: &mut sqlx::SqliteConnection, teacher_ids: Vec<UserId>) -> Result<HashMap<UserId, String>> {
    let teachers = Users::new(conn).get_bulk(teacher_ids).await?;
    Ok(teachers.into_iter().map(|(id, user)| (id, user.username)).collect())
}

/// The course catalogue, newest first, with seat counts and the caller's enrollment state
#[utoipa::path(
    get,
    path = "/student/courses",
    tag = "student",
    responses(
        (status = 200, description = "All courses", body = StudentCourseListResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a student", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(student_id = %student.id))]
pub async fn list_courses(State(state): State<AppState>, student: RequiresRole<role::Student>) -> Result<Json<StudentCourseListResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let courses = Courses::new(&mut conn).list(&CourseFilter::all()).await?;

    let course_ids: Vec<CourseId> = courses.iter().map(|c| c.id).collect();
    let mut enrollments = Enrollments::new(&mut conn);
    let counts = enrollments.counts_for_courses(&course_ids).await?;
    let mine = enrollments.enrolled_course_ids(student.id).await?;

    let teacher_ids = courses.iter().map(|c| c.teacher_id).collect();
    let teachers = teacher_names(&mut conn, teacher_ids).await?;

    let courses = courses
        .into_iter()
        .map(|course| {
            let enrolled = counts.get(&course.id).copied().unwrap_or(0);
            StudentCourseResponse {
                id: course.id,
                teacher: teachers.get(&course.teacher_id).cloned().unwrap_or_default(),
                is_full: enrolled >= course.capacity,
                is_enrolled: mine.contains(&course.id),
                name: course.name,
                description: course.description,
                capacity: course.capacity,
                enrolled,
            }
        })
        .collect();

    Ok(Json(StudentCourseListResponse { courses }))
}

/// Courses the caller is enrolled in, most recent enrollment first
#[utoipa::path(
    get,
    path = "/student/my-courses",
    tag = "student",
    responses(
        (status = 200, description = "Enrolled courses", body = MyCourseListResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a student", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(student_id = %student.id))]
pub async fn my_courses(State(state): State<AppState>, student: RequiresRole<role::Student>) -> Result<Json<MyCourseListResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut enrollments = Enrollments::new(&mut conn);

    let rows = enrollments.list_for_student(student.id).await?;
    let course_ids: Vec<CourseId> = rows.iter().map(|r| r.course_id).collect();
    let counts = enrollments.counts_for_courses(&course_ids).await?;

    let courses = rows
        .into_iter()
        .map(|row| {
            let enrolled = counts.get(&row.course_id).copied().unwrap_or(0);
            MyCourseResponse {
                id: row.course_id,
                name: row.course_name,
                description: row.course_description,
                teacher: row.teacher_username,
                capacity: row.course_capacity,
                enrolled,
                is_full: enrolled >= row.course_capacity,
                enrolled_at: row.enrolled_at,
            }
        })
        .collect();

    Ok(Json(MyCourseListResponse { courses }))
}

/// Take a seat in a course
#[utoipa::path(
    post,
    path = "/student/enroll",
    request_body = EnrollRequest,
    tag = "student",
    responses(
        (status = 201, description = "Enrolled", body = EnrolledResponse),
        (status = 400, description = "Course full or already enrolled", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a student", body = crate::errors::ErrorResponse),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(student_id = %student.id, course_id = %request.course_id))]
pub async fn enroll(
    State(state): State<AppState>,
    student: RequiresRole<role::Student>,
    Json(request): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrolledResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // The capacity check and the insert are a single statement inside the repository's transaction
    let enrollment = Enrollments::new(&mut conn)
        .enroll(student.id, request.course_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "课程".to_string(),
                id: request.course_id.to_string(),
            },
            DbError::UniqueViolation { .. } => Error::Conflict {
                message: "已经选过这门课程".to_string(),
            },
            DbError::CapacityExceeded { entity_id, .. } => Error::CourseFull { course_id: entity_id },
            other => Error::Database(other),
        })?;

    tracing::info!(enrollment_id = %enrollment.id, "Student enrolled");

    Ok((
        StatusCode::CREATED,
        Json(EnrolledResponse {
            message: "选课成功".to_string(),
            enrollment: EnrollmentResponse::from(enrollment),
        }),
    ))
}

/// Give up a seat
#[utoipa::path(
    post,
    path = "/student/drop",
    request_body = EnrollRequest,
    tag = "student",
    responses(
        (status = 200, description = "Dropped", body = MessageResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a student", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not enrolled in this course", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(student_id = %student.id, course_id = %request.course_id))]
pub async fn drop_course(
    State(state): State<AppState>,
    student: RequiresRole<role::Student>,
    Json(request): Json<EnrollRequest>,
) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Enrollments::new(&mut conn)
        .drop(student.id, request.course_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "选课记录".to_string(),
                id: request.course_id.to_string(),
            },
            other => Error::Database(other),
        })?;

    Ok(Json(MessageResponse::new("退课成功")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::{Role, UserResponse};
    use crate::errors::ErrorResponse;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_course, create_test_user};
    use serde_json::json;
    use sqlx::SqlitePool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_courses_shows_counts_and_state(pool: SqlitePool) {
        let teacher = create_test_user(&pool, Role::Teacher).await;
        let student = create_test_user(&pool, Role::Student).await;
        let other = create_test_user(&pool, Role::Student).await;
        let older = create_test_course(&pool, teacher.id, 1).await;
        let newer = create_test_course(&pool, teacher.id, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        Enrollments::new(&mut conn).enroll(other.id, older.id).await.unwrap();
        Enrollments::new(&mut conn).enroll(student.id, newer.id).await.unwrap();
        drop(conn);

        let server = create_test_app(pool).await;
        let headers = add_auth_headers(&student);
        let response = server.get("/student/courses").add_header(headers.0, headers.1).await;

        response.assert_status_ok();
        let body: StudentCourseListResponse = response.json();
        assert_eq!(body.courses.len(), 2);

        let first = &body.courses[0];
        assert_eq!(first.id, newer.id);
        assert_eq!(first.teacher, teacher.username);
        assert_eq!(first.enrolled, 1);
        assert!(first.is_enrolled);
        assert!(!first.is_full);

        let second = &body.courses[1];
        assert_eq!(second.id, older.id);
        assert!(second.is_full);
        assert!(!second.is_enrolled);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_teacher_cannot_use_student_endpoints(pool: SqlitePool) {
        let teacher = create_test_user(&pool, Role::Teacher).await;
        let server = create_test_app(pool).await;
        let headers = add_auth_headers(&teacher);

        let response = server.get("/student/courses").add_header(headers.0, headers.1).await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<ErrorResponse>().error, "权限不足：仅学生可以访问此接口");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_student_endpoints_require_session(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        server.get("/student/my-courses").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/student/enroll")
            .json(&json!({"course_id": Uuid::new_v4()}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_enroll_and_my_courses(pool: SqlitePool) {
        let teacher = create_test_user(&pool, Role::Teacher).await;
        let student = create_test_user(&pool, Role::Student).await;
        let course = create_test_course(&pool, teacher.id, 3).await;
        let server = create_test_app(pool).await;
        let headers = add_auth_headers(&student);

        let response = server
            .post("/student/enroll")
            .add_header(headers.0.clone(), headers.1.clone())
            .json(&json!({"course_id": course.id}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: EnrolledResponse = response.json();
        assert_eq!(body.message, "选课成功");
        assert_eq!(body.enrollment.course_id, course.id);
        assert_eq!(body.enrollment.student_id, student.id);

        let response = server.get("/student/my-courses").add_header(headers.0, headers.1).await;
        response.assert_status_ok();
        let body: MyCourseListResponse = response.json();
        assert_eq!(body.courses.len(), 1);
        assert_eq!(body.courses[0].id, course.id);
        assert_eq!(body.courses[0].enrolled, 1);
        assert_eq!(body.courses[0].teacher, teacher.username);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_enroll_twice_is_rejected(pool: SqlitePool) {
        let teacher = create_test_user(&pool, Role::Teacher).await;
        let student = create_test_user(&pool, Role::Student).await;
        let course = create_test_course(&pool, teacher.id, 3).await;
        let server = create_test_app(pool).await;
        let headers = add_auth_headers(&student);

        server
            .post("/student/enroll")
            .add_header(headers.0.clone(), headers.1.clone())
            .json(&json!({"course_id": course.id}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/student/enroll")
            .add_header(headers.0, headers.1)
            .json(&json!({"course_id": course.id}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().error, "已经选过这门课程");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_enroll_unknown_course(pool: SqlitePool) {
        let student = create_test_user(&pool, Role::Student).await;
        let server = create_test_app(pool).await;
        let headers = add_auth_headers(&student);

        let response = server
            .post("/student/enroll")
            .add_header(headers.0, headers.1)
            .json(&json!({"course_id": Uuid::new_v4()}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ErrorResponse>().error, "课程不存在");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_enroll_malformed_body(pool: SqlitePool) {
        let student = create_test_user(&pool, Role::Student).await;
        let server = create_test_app(pool).await;
        let headers = add_auth_headers(&student);

        for body in [json!({"course_id": "not-a-uuid"}), json!({}), json!({"course_id": 42})] {
            let response = server
                .post("/student/enroll")
                .add_header(headers.0.clone(), headers.1.clone())
                .json(&body)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.json::<ErrorResponse>().error, "请求参数无效");
        }

        let response = server
            .post("/student/drop")
            .add_header(headers.0, headers.1)
            .text("course_id=1")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().error, "请求参数无效");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_capacity_walkthrough(pool: SqlitePool) {
        let teacher = create_test_user(&pool, Role::Teacher).await;
        let a = create_test_user(&pool, Role::Student).await;
        let b = create_test_user(&pool, Role::Student).await;
        let c = create_test_user(&pool, Role::Student).await;
        let course = create_test_course(&pool, teacher.id, 2).await;
        let server = create_test_app(pool.clone()).await;

        let enroll = |user: &UserResponse| {
            let headers = add_auth_headers(user);
            server
                .post("/student/enroll")
                .add_header(headers.0, headers.1)
                .json(&json!({"course_id": course.id}))
        };

        enroll(&a).await.assert_status(StatusCode::CREATED);
        enroll(&b).await.assert_status(StatusCode::CREATED);

        let response = enroll(&c).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().error, "课程已满");

        let headers = add_auth_headers(&a);
        let response = server
            .post("/student/drop")
            .add_header(headers.0, headers.1)
            .json(&json!({"course_id": course.id}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<MessageResponse>().message, "退课成功");

        enroll(&c).await.assert_status(StatusCode::CREATED);

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(Enrollments::new(&mut conn).count_for_course(course.id).await.unwrap(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_drop_without_enrollment(pool: SqlitePool) {
        let teacher = create_test_user(&pool, Role::Teacher).await;
        let student = create_test_user(&pool, Role::Student).await;
        let course = create_test_course(&pool, teacher.id, 3).await;
        let server = create_test_app(pool).await;
        let headers = add_auth_headers(&student);

        let response = server
            .post("/student/drop")
            .add_header(headers.0, headers.1)
            .json(&json!({"course_id": course.id}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ErrorResponse>().error, "选课记录不存在");
    }
}
