//! Profile handlers for the authenticated user.

use axum::Json;
use axum::extract::State;
use moon_core::models::auth::ProfileUpdate;
use moon_core::validation;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ProfileResponse, UpdateProfileRequest};

/// `GET /users/profile`
pub async fn get_profile_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.auth.profile(&user.0.user_id).await?;
    Ok(Json(profile.into()))
}

/// `PUT /users/profile`: change nickname, birthday, about-me or phone.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    if let Some(nickname) = &body.nickname {
        validation::validate_nickname(nickname)?;
    }
    if let Some(about_me) = &body.about_me {
        validation::validate_about_me(about_me)?;
    }
    let update = ProfileUpdate {
        nickname: body.nickname.map(|n| n.trim().to_string()),
        birthday: body.birthday,
        about_me: body.about_me,
        phone: body.phone,
    };
    let profile = state.auth.update_profile(&user.0.user_id, update).await?;
    Ok(Json(profile.into()))
}
