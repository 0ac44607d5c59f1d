//! OpenAPI documentation for the enrollment API.
//!
//! [`ApiDoc`] covers every endpoint. It is served as JSON at `/api-docs/openapi.json` and rendered
//! with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Session cookie issued by `/register` and `/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "selcon_session",
                    "Signed session token set by `/register` and `/login`. The cookie name follows `auth.session.cookie_name`.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "selcon",
        description = "Course enrollment API. Students browse, enroll in and drop courses; teachers create courses and read their rosters."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::current_user,
        api::handlers::student::list_courses,
        api::handlers::student::my_courses,
        api::handlers::student::enroll,
        api::handlers::student::drop_course,
        api::handlers::teacher::list_courses,
        api::handlers::teacher::create_course,
        api::handlers::teacher::delete_course,
        api::handlers::teacher::course_students,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::CurrentUserResponse,
            api::models::auth::MessageResponse,
            api::models::courses::CourseCreate,
            api::models::courses::CourseResponse,
            api::models::courses::CourseCreatedResponse,
            api::models::courses::StudentCourseResponse,
            api::models::courses::StudentCourseListResponse,
            api::models::courses::MyCourseResponse,
            api::models::courses::MyCourseListResponse,
            api::models::courses::TeacherCourseResponse,
            api::models::courses::TeacherCourseListResponse,
            api::models::enrollments::EnrollRequest,
            api::models::enrollments::EnrollmentResponse,
            api::models::enrollments::EnrolledResponse,
            api::models::enrollments::RosterStudent,
            api::models::enrollments::CourseSummary,
            api::models::enrollments::CourseStudentsResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, login and the session cookie."),
        (name = "student", description = "Course catalogue, enrollment and drops. Student accounts only."),
        (name = "teacher", description = "Course management and rosters. Teacher accounts only; deletes and rosters are limited to the owning teacher."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/register",
            "/login",
            "/logout",
            "/current-user",
            "/student/courses",
            "/student/my-courses",
            "/student/enroll",
            "/student/drop",
            "/teacher/courses",
            "/teacher/courses/create",
            "/teacher/courses/{id}",
            "/teacher/courses/{id}/students",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("CookieAuth"));
    }
}
