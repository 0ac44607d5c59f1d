use axum::extract::State;

use crate::{
    AppState,
    api::extract::Json,
    api::models::{
        auth::{AuthResponse, CurrentUserResponse, LoginRequest, LoginResponse, LogoutResponse, MessageResponse, RegisterRequest, RegisterResponse},
        users::{CurrentUser, Role, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
};

const INVALID_CREDENTIALS: &str = "用户名或密码错误";

/// Present and non-blank, trimmed
fn required(field: Option<String>) -> Option<String> {
    field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Register a new student or teacher account
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Missing field, invalid role, bad password or duplicate username/email", body = crate::errors::ErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse, Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "注册功能已关闭".to_string(),
        });
    }

    let (Some(username), Some(email), Some(password), Some(role)) = (
        required(request.username),
        required(request.email),
        // Passwords are not trimmed
        request.password.filter(|p| !p.is_empty()),
        required(request.role),
    ) else {
        return Err(Error::BadRequest {
            message: "所有字段都是必填的".to_string(),
        });
    };

    let role = match role.as_str() {
        "student" => Role::Student,
        "teacher" => Role::Teacher,
        _ => {
            return Err(Error::BadRequest {
                message: "无效的角色".to_string(),
            });
        }
    };

    // Validate password length
    let password_config = &state.config.auth.password;
    let length = password.chars().count();
    if length < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("密码长度至少为{}个字符", password_config.min_length),
        });
    }
    if length > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("密码长度不能超过{}个字符", password_config.max_length),
        });
    }

    // Hash before opening the write transaction
    let password_hash = password::hash_password(password, password_config.into()).await?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    if user_repo.get_user_by_username(&username).await?.is_some() {
        return Err(Error::Conflict {
            message: "用户名已存在".to_string(),
        });
    }
    if user_repo.get_user_by_email(&email).await?.is_some() {
        return Err(Error::Conflict {
            message: "邮箱已存在".to_string(),
        });
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            username,
            email,
            role,
            password_hash,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    let user_response = UserResponse::from(created_user);

    let current_user: CurrentUser = user_response.clone().into();
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config);

    tracing::info!(user_id = %user_response.id, role = %user_response.role, "User registered");

    let auth_response = AuthResponse {
        message: "注册成功".to_string(),
        user: user_response,
    };

    Ok(RegisterResponse { auth_response, cookie })
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let invalid = || Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    };

    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut pool_conn).get_user_by_username(username.trim()).await?;
    drop(pool_conn);

    let Some(user) = user else {
        // Same cost as a real check, so response time does not reveal which usernames exist
        password::verify_against_dummy(password).await?;
        return Err(invalid());
    };

    if !password::verify_password(password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let user_response = UserResponse::from(user);

    let current_user: CurrentUser = user_response.clone().into();
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        message: "登录成功".to_string(),
        user: user_response,
    };

    Ok(LoginResponse { auth_response, cookie })
}

/// Logout (clear session cookie)
#[utoipa::path(
    post,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        response: MessageResponse::new("登出成功"),
        cookie: session::clear_session_cookie(&state.config),
    }
}

/// The logged-in user, re-read from the store
#[utoipa::path(
    get,
    path = "/current-user",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Not logged in, or the account no longer exists", body = crate::errors::ErrorResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn current_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<CurrentUserResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut pool_conn)
        .get_by_id(current_user.id)
        .await?
        // A session for an account that no longer exists is no session
        .ok_or(Error::Unauthenticated { message: None })?;

    Ok(Json(CurrentUserResponse {
        user: UserResponse::from(user),
    }))
}
