use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use wardrobe_core::domain::cart::UserId;
use wardrobe_core::validation::RegistrationForm;
use wardrobe_core::wire::{CityUpdate, MessageBody, RegisteredUser, RegistrationResponse};
use wardrobe_db::repositories::{UserRecord, UserRepository};

use super::{ApiError, ApiState};

/// Creates a shopper account. The password is checked for shape only;
/// credentials are not stored here.
pub async fn register(
    State(state): State<ApiState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    form.validate()?;

    let record = UserRecord::new(form.username.trim(), form.email.trim());
    if !state.users.create(&record).await? {
        return Err(ApiError::bad_request("Username or email already in use"));
    }
    info!(event_name = "api.user.registered", user_id = %record.id, "user registered");

    let user = RegisteredUser { id: record.id, username: record.username, email: record.email };
    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse { message: "User registered successfully".to_string(), user }),
    ))
}

pub async fn update_city(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Json(update): Json<CityUpdate>,
) -> Result<Json<MessageBody>, ApiError> {
    let city = update.city.trim();
    if city.is_empty() {
        return Err(ApiError::bad_request("City is required"));
    }

    let user_id = UserId(user_id);
    if !state.users.update_city(&user_id, city).await? {
        return Err(ApiError::not_found("User not found"));
    }
    info!(event_name = "api.user.city_updated", user_id = %user_id, city = %city, "city updated");
    Ok(Json(MessageBody::new("City updated")))
}
