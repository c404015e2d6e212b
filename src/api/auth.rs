//! Account endpoints: register, login, password reset

use crate::api::{Envelope, MessageResponse};
use crate::domain::{CredentialsInput, RegisterInput};
use crate::error::Result;
use crate::state::HasServices;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub id: i64,
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    pub data: LoginData,
}

pub async fn register<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse> {
    state.auth_service().register(input).await?;
    Ok(MessageResponse::ok("Success register account"))
}

pub async fn login<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<CredentialsInput>,
) -> Result<impl IntoResponse> {
    let outcome = state.auth_service().login(input).await?;
    Ok(Envelope::ok(
        "Success",
        LoginPayload {
            data: LoginData {
                id: outcome.user.id,
                token: outcome.token,
                email: outcome.user.email,
            },
        },
    ))
}

pub async fn forgot_password<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse> {
    state.auth_service().forgot_password(input).await?;
    Ok(MessageResponse::ok("Success reset password"))
}
