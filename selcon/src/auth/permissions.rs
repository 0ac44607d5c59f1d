//! Role gates for handlers.
//!
//! Every account is either a student or a teacher, and most endpoints serve only one of them.
//! Handlers declare the role they need in their signature:
//!
//! ```ignore
//! use selcon::auth::permissions::{RequiresRole, role};
//!
//! async fn my_courses(student: RequiresRole<role::Student>) -> Result<Json<...>> {
//!     let student_id = student.id;
//!     // ...
//! }
//! ```
//!
//! No session yields 401 and a session of the other role yields 403. Ownership of a course is a
//! separate check done by the handler once the course is loaded ([`require_course_owner`]).

use std::{marker::PhantomData, ops::Deref};

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::{Operation, UserId},
};

/// Type-level roles for [`RequiresRole`]
pub mod role {
    use crate::api::models::users::Role;

    pub trait RoleMarker: Send + Sync + 'static {
        const ROLE: Role;
    }

    pub struct Student;
    pub struct Teacher;

    impl RoleMarker for Student {
        const ROLE: Role = Role::Student;
    }

    impl RoleMarker for Teacher {
        const ROLE: Role = Role::Teacher;
    }
}

/// Authenticated caller holding role `R`; derefs to [`CurrentUser`]
pub struct RequiresRole<R> {
    user: CurrentUser,
    _role: PhantomData<R>,
}

impl<R> Deref for RequiresRole<R> {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// Check a caller against a required role
pub fn require_role(user: &CurrentUser, required: Role) -> Result<()> {
    if user.role == required {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Some(required),
            action: Operation::Access,
            resource: "此接口".to_string(),
        })
    }
}

/// Only the teacher who created a course may delete it or read its roster
pub fn require_course_owner(user: &CurrentUser, teacher_id: UserId, action: Operation) -> Result<()> {
    if user.id == teacher_id {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: None,
            action,
            resource: "该课程".to_string(),
        })
    }
}

impl<R: role::RoleMarker> FromRequestParts<AppState> for RequiresRole<R> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require_role(&user, R::ROLE)?;

        Ok(Self {
            user,
            _role: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&user(Role::Student), Role::Student).is_ok());

        let err = require_role(&user(Role::Student), Role::Teacher).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.user_message(), "权限不足：仅教师可以访问此接口");
    }

    #[test]
    fn test_require_course_owner() {
        let teacher = user(Role::Teacher);
        assert!(require_course_owner(&teacher, teacher.id, Operation::Delete).is_ok());

        let err = require_course_owner(&teacher, Uuid::new_v4(), Operation::Delete).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.user_message(), "权限不足：无权删除该课程");
    }

    #[test]
    fn test_role_markers() {
        assert_eq!(<role::Student as role::RoleMarker>::ROLE, Role::Student);
        assert_eq!(<role::Teacher as role::RoleMarker>::ROLE, Role::Teacher);
    }
}
