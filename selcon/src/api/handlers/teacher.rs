use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    api::extract::{Json, Path},
    api::models::{
        auth::MessageResponse,
        courses::{CourseCreate, CourseCreatedResponse, CourseResponse, TeacherCourseListResponse, TeacherCourseResponse},
        enrollments::{CourseStudentsResponse, CourseSummary, RosterStudent},
    },
    auth::permissions::{RequiresRole, require_course_owner, role},
    db::{
        handlers::{Courses, Enrollments, Repository, courses::CourseFilter},
        models::courses::{CourseCreateDBRequest, CourseDBResponse},
    },
    errors::{Error, Result},
    types::{CourseId, Operation},
};

async fn fetch_course(conn: &mut sqlx::SqliteConnection, course_id: CourseId) -> Result<CourseDBResponse> {
    Courses::new(conn).get_by_id(course_id).await?.ok_or_else(|| Error::NotFound {
        resource: "课程".to_string(),
        id: course_id.to_string(),
    })
}

/// Courses owned by the caller, newest first
#[utoipa::path(
    get,
    path = "/teacher/courses",
    tag = "teacher",
    responses(
        (status = 200, description = "Own courses", body = TeacherCourseListResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a teacher", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(teacher_id = %teacher.id))]
pub async fn list_courses(State(state): State<AppState>, teacher: RequiresRole<role::Teacher>) -> Result<Json<TeacherCourseListResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let courses = Courses::new(&mut conn).list(&CourseFilter::for_teacher(teacher.id)).await?;
    let course_ids: Vec<CourseId> = courses.iter().map(|c| c.id).collect();
    let counts = Enrollments::new(&mut conn).counts_for_courses(&course_ids).await?;

    let courses = courses
        .into_iter()
        .map(|course| {
            let enrolled = counts.get(&course.id).copied().unwrap_or(0);
            TeacherCourseResponse::new(course, enrolled)
        })
        .collect();

    Ok(Json(TeacherCourseListResponse { courses }))
}

/// Create a course owned by the caller
#[utoipa::path(
    post,
    path = "/teacher/courses/create",
    request_body = CourseCreate,
    tag = "teacher",
    responses(
        (status = 201, description = "Course created", body = CourseCreatedResponse),
        (status = 400, description = "Empty name or non-positive capacity", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a teacher", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(teacher_id = %teacher.id))]
pub async fn create_course(
    State(state): State<AppState>,
    teacher: RequiresRole<role::Teacher>,
    Json(create): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseCreatedResponse>)> {
    let name = create.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(Error::BadRequest {
            message: "课程名称不能为空".to_string(),
        });
    }

    let capacity = create.capacity.unwrap_or(state.config.courses.default_capacity);
    if capacity <= 0 {
        return Err(Error::BadRequest {
            message: "课程容量必须大于0".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let course = Courses::new(&mut conn)
        .create(&CourseCreateDBRequest {
            name: name.to_string(),
            description: create.description.unwrap_or_default(),
            teacher_id: teacher.id,
            capacity,
        })
        .await?;

    tracing::info!(course_id = %course.id, capacity, "Course created");

    Ok((
        StatusCode::CREATED,
        Json(CourseCreatedResponse {
            message: "课程创建成功".to_string(),
            course: CourseResponse::from(course),
        }),
    ))
}

/// Delete a course and all its enrollments
#[utoipa::path(
    delete,
    path = "/teacher/courses/{id}",
    tag = "teacher",
    params(
        ("id" = uuid::Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller does not own the course", body = crate::errors::ErrorResponse),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(teacher_id = %teacher.id, course_id = %id))]
pub async fn delete_course(
    State(state): State<AppState>,
    teacher: RequiresRole<role::Teacher>,
    Path(id): Path<CourseId>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let course = fetch_course(&mut tx, id).await?;
    require_course_owner(&teacher, course.teacher_id, Operation::Delete)?;

    if !Courses::new(&mut tx).delete(id).await? {
        return Err(Error::NotFound {
            resource: "课程".to_string(),
            id: id.to_string(),
        });
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new(format!("已删除课程：{}", course.name))))
}

/// Roster of a course, most recent enrollment first
#[utoipa::path(
    get,
    path = "/teacher/courses/{id}/students",
    tag = "teacher",
    params(
        ("id" = uuid::Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Enrolled students", body = CourseStudentsResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller does not own the course", body = crate::errors::ErrorResponse),
        (status = 404, description = "Course not found", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(teacher_id = %teacher.id, course_id = %id))]
pub async fn course_students(
    State(state): State<AppState>,
    teacher: RequiresRole<role::Teacher>,
    Path(id): Path<CourseId>,
) -> Result<Json<CourseStudentsResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let course = fetch_course(&mut conn, id).await?;
    require_course_owner(&teacher, course.teacher_id, Operation::Read)?;

    let students: Vec<RosterStudent> = Enrollments::new(&mut conn)
        .list_for_course(id)
        .await?
        .into_iter()
        .map(RosterStudent::from)
        .collect();

    Ok(Json(CourseStudentsResponse {
        course: CourseSummary {
            id: course.id,
            name: course.name,
        },
        total: students.len(),
        students,
    }))
}
