//! API Middleware
//!
//! Bearer-token authentication gate for Axum. Validates the JWT, checks that
//! the subject account still exists, and attaches the caller's identity to
//! the request.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::auth_service::{extract_bearer_token, AuthService};
use crate::shared::authorization::AuthContext;
use crate::shared::error::AdmissionsError;
use crate::user::repository::UserRepository;

/// Application state containing the services the gate needs
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_repo: Arc<UserRepository>,
}

/// Authenticated caller extractor
/// Validates the bearer token and resolves the account behind it.
pub struct Authenticated(pub AuthContext);

impl std::ops::Deref for Authenticated {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // AppState is injected by AuthLayer
        let app_state = parts
            .extensions
            .get::<AppState>()
            .ok_or_else(|| {
                AdmissionsError::internal("Auth services not configured").into_response()
            })?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| {
                AdmissionsError::unauthorized(
                    "You are not logged in! Please log in to get access.",
                )
                .into_response()
            })?;

        let claims = app_state
            .auth_service
            .validate_token(token)
            .map_err(|e| e.into_response())?;

        // The account may have been deleted after the token was issued.
        let user = app_state
            .user_repo
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| e.into_response())?
            .ok_or_else(|| {
                AdmissionsError::unauthorized(
                    "The account belonging to this token no longer exists.",
                )
                .into_response()
            })?;

        Ok(Authenticated(AuthContext::from_user(&user)))
    }
}

/// Middleware layer that injects AppState into request extensions
/// This enables the Authenticated extractor to work
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::Layer;
use tower::Service;

#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}
