use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, FromRequestParts, Path, Request, State},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, COOKIE, SET_COOKIE, USER_AGENT},
        request::Parts,
    },
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use super::validation::parse_id;
use super::{ApiError, ApiResponse, AppState};
use crate::models::FieldError;
use crate::models::session::{
    AuthResult, ClientMeta, Identity, RefreshResult, SessionGrant, SessionSummary,
};
use crate::models::user::Actor;
use crate::services::RegisterRequest;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "sessionToken";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    pub session_id: Option<Uuid>,
}

#[derive(Deserialize, Default)]
pub struct LogoutRequest {
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub revoked: u64,
}

// ============================================================================
// Request context
// ============================================================================

/// The resolved caller of a request. Attached by [`context_middleware`] to
/// every request under `/api`; absent identity means anonymous.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<Identity>,
}

/// A request with a resolved identity. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl Authenticated {
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.identity.clone())
            .map(Self)
            .ok_or_else(ApiError::unauthorized)
    }
}

/// An authenticated admin. Rejects with 401 when anonymous, 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Authenticated(identity) = Authenticated::from_request_parts(parts, state).await?;

        if identity.actor().is_admin() {
            Ok(Self(identity))
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }
}

/// Client metadata recorded on new sessions.
pub struct RequestMeta(pub ClientMeta);

impl FromRequestParts<Arc<AppState>> for RequestMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(ToString::to_string);

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let ip_address = client_ip(
            &parts.headers,
            peer,
            state.config().server.trust_forwarded_for,
        );

        Ok(Self(ClientMeta {
            ip_address,
            user_agent,
        }))
    }
}

/// The peer address, or the first `X-Forwarded-For` hop when the proxy is trusted.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded: bool,
) -> Option<String> {
    let forwarded = trust_forwarded
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());

    forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()))
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller's token (if any) and attaches a [`RequestContext`].
/// Never rejects: protected handlers decide via their extractors.
pub async fn context_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match extract_token(request.headers()) {
        Some(token) => state.auth_service().resolve_token(&token).await,
        None => None,
    };

    if let Some(identity) = &identity {
        tracing::Span::current().record("user_id", tracing::field::display(identity.user.id));
    }

    request.extensions_mut().insert(RequestContext { identity });
    next.run(request).await
}

/// Token from `Authorization: Bearer`, else from the session cookie (URL-decoded).
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| urlencoding::decode(value.trim()).ok())
        .map(std::borrow::Cow::into_owned)
        .filter(|token| !token.is_empty())
}

const COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; Secure; SameSite=Strict";

fn session_cookie(grant: &SessionGrant) -> String {
    let max_age = (grant.expires_at - chrono::Utc::now()).num_seconds().max(0);
    format!(
        "{SESSION_COOKIE}={}; {COOKIE_ATTRIBUTES}; Max-Age={max_age}",
        urlencoding::encode(&grant.token)
    )
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; {COOKIE_ATTRIBUTES}; Max-Age=0")
}

/// Parses an optional JSON body; an empty body yields the default.
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| ApiError::validation(format!("Invalid JSON: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, opening a new session
pub async fn login(
    State(state): State<Arc<AppState>>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut missing = Vec::new();
    if payload.username.is_empty() {
        missing.push(FieldError::new("username", "Username is required"));
    }
    if payload.password.is_empty() {
        missing.push(FieldError::new("password", "Password is required"));
    }
    if !missing.is_empty() {
        return Err(ApiError::InvalidFields(missing));
    }

    let result = state
        .auth_service()
        .login(&payload.username, &payload.password, meta)
        .await?;

    Ok(with_session_cookie(result))
}

/// POST /auth/register
/// Create an account and log it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    RequestMeta(meta): RequestMeta,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.auth_service().register(payload, meta).await?;
    Ok(with_session_cookie(result))
}

fn with_session_cookie(result: AuthResult) -> impl IntoResponse {
    let cookie = session_cookie(&result.session);
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::success(result)),
    )
}

/// GET /auth/me
pub async fn me(Authenticated(identity): Authenticated) -> Json<ApiResponse<Identity>> {
    Json(ApiResponse::success(identity))
}

/// POST /auth/refresh
/// Slide the expiry of a session; defaults to the current one
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    body: Bytes,
) -> Result<Json<ApiResponse<RefreshResult>>, ApiError> {
    let payload: RefreshRequest = optional_json(&body)?;
    let session_id = payload.session_id.unwrap_or(identity.session.id);

    let result = state
        .auth_service()
        .refresh_session(session_id, identity.user.id)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/logout
/// Deactivate the current session, a named session, or all of them
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: LogoutRequest = optional_json(&body)?;
    let session_id = payload.session_id.unwrap_or(identity.session.id);

    let revoked = state
        .auth_service()
        .logout(session_id, identity.user.id, payload.all)
        .await?;

    let current_revoked = payload.all || session_id == identity.session.id;
    let headers = current_revoked.then(|| AppendHeaders([(SET_COOKIE, expired_session_cookie())]));

    Ok((headers, Json(ApiResponse::success(LogoutResponse { revoked }))))
}

/// GET /auth/sessions
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, ApiError> {
    let sessions = state
        .auth_service()
        .list_sessions(identity.user.id)
        .await?;
    Ok(Json(ApiResponse::success(sessions)))
}

/// GET /auth/sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionSummary>>, ApiError> {
    let session_id = parse_id("Session", &id)?;
    let session = state
        .auth_service()
        .get_session(session_id, identity.user.id)
        .await?;
    Ok(Json(ApiResponse::success(session)))
}
