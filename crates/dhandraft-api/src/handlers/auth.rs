use axum::extract::State;
use chrono::Utc;
use dhandraft_core::{new_id, normalize_email, AuthError, User, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    fn for_user(state: &AppState, user: &User) -> ApiResult<Self> {
        Ok(Self {
            token: state.jwt.issue(&user.id, &user.email)?,
            user: SessionUser {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
            },
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<ApiResponse<Session>> {
    let user = User {
        id: new_id(),
        name: req.name,
        email: normalize_email(&req.email),
        password: state.passwords.hash(&req.password)?,
        risk_personality: "Undetermined".to_string(),
        financial_health_score: 0,
        created_at: Utc::now(),
    };

    if !state.db.create_user(&user).await? {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }
    info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::with_message(
        Session::for_user(&state, &user)?,
        "Registration successful",
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<Session>> {
    let user = state
        .db
        .find_user_by_email(&req.email)
        .await?
        .filter(|user| state.passwords.verify(&req.password, &user.password))
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(ApiResponse::with_message(
        Session::for_user(&state, &user)?,
        "Login successful",
    ))
}

pub async fn me(user: AuthUser) -> ApiResponse<UserProfile> {
    ApiResponse::with_message(user.profile(), "User profile")
}
