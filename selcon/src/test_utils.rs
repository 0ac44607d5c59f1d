//! Test utilities shared by the unit and HTTP-level tests.

use crate::api::models::{
    courses::CourseResponse,
    users::{CurrentUser, Role, UserResponse},
};
use crate::auth::{password, session};
use crate::config::{Config, CorsConfig, CorsOrigin, PoolSettings};
use crate::db::{
    handlers::{Courses, Repository, Users},
    models::{courses::CourseCreateDBRequest, users::UserCreateDBRequest},
};
use crate::types::UserId;
use axum_test::TestServer;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Password set on every user made by [`create_test_user`]
pub const TEST_PASSWORD: &str = "password123";

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-selcon".to_string()),
        ..Default::default()
    };

    config.database.pool = PoolSettings {
        max_connections: 4,
        min_connections: 0,
        ..Default::default()
    };

    // Cheap hashing keeps the suite fast
    config.auth.password.argon2_memory_kib = 128;
    config.auth.password.argon2_iterations = 1;
    config.auth.password.argon2_parallelism = 1;

    config.auth.session.cookie_secure = false;
    config.auth.security.cors = CorsConfig {
        allowed_origins: vec![CorsOrigin::Url("http://localhost:3000".parse().expect("valid URL"))],
        allow_credentials: true,
        max_age: Some(60),
    };

    config
}

pub async fn create_test_user(pool: &SqlitePool, role: Role) -> UserResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let username = format!("testuser_{}", Uuid::new_v4().simple());
    let email = format!("{username}@example.com");

    let config = create_test_config();
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Some((&config.auth.password).into()))
        .expect("Failed to hash test password");

    let user_create = UserCreateDBRequest {
        username,
        email,
        role,
        password_hash,
    };

    let user = users_repo.create(&user_create).await.expect("Failed to create test user");
    UserResponse::from(user)
}

pub async fn create_test_course(pool: &SqlitePool, teacher_id: UserId, capacity: i64) -> CourseResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut courses_repo = Courses::new(&mut conn);

    let request = CourseCreateDBRequest {
        name: format!("course_{}", Uuid::new_v4().simple()),
        description: "Test course".to_string(),
        teacher_id,
        capacity,
    };

    let course = courses_repo.create(&request).await.expect("Failed to create test course");
    CourseResponse::from(course)
}

/// `Cookie` header carrying a valid session for `user`
pub fn add_auth_headers(user: &UserResponse) -> (String, String) {
    let config = create_test_config();
    let token = session::create_session_token(&CurrentUser::from(user.clone()), &config).expect("Failed to create session token");
    ("cookie".to_string(), format!("{}={token}", config.auth.session.cookie_name))
}
