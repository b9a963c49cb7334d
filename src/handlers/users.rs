use axum::{
    Json,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::db::UserGateway;
use crate::error::UserError;
use crate::service::UserService;
use crate::types::{SignUpRequest, UserView};

/// POST /signup -> 201 with the created user, credential stripped.
pub async fn sign_up<G: UserGateway + 'static>(
    State(service): State<UserService<G>>,
    SignUpJson(req): SignUpJson,
) -> Result<impl IntoResponse, UserError> {
    let user = service.sign_up(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users -> 200 with every user in creation order.
pub async fn get_all_users<G: UserGateway + 'static>(
    State(service): State<UserService<G>>,
) -> Result<Json<Vec<UserView>>, UserError> {
    Ok(Json(service.list_users().await?))
}

/// JSON body extractor whose rejections surface as [`UserError::BadRequest`].
pub struct SignUpJson(pub SignUpRequest);

impl<S> FromRequest<S> for SignUpJson
where
    S: Send + Sync,
{
    type Rejection = UserError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<SignUpRequest>::from_request(req, state).await {
            Ok(Json(body)) => Ok(SignUpJson(body)),
            Err(rejection) => Err(UserError::BadRequest(rejection.body_text())),
        }
    }
}
