//! Public auth endpoints: signup, login, logout, refresh (§4.D/§4.E).

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, http::HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use warden_core::models::user::{CreateUser, SigninUser};
use warden_core::refresh_store::RefreshStore;
use warden_core::repository::UserRepository;

use crate::error::AppError;
use crate::state::AppState;

const REFRESH_COOKIE_NAME: &str = "refresh";

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupOutput {
  pub id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenOutput {
  pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FingerprintBody {
  pub fingerprint: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusOutput {
  pub status: bool,
}

pub async fn signup_handler(
  State(state): State<AppState>,
  Json(input): Json<CreateUser>,
) -> Result<impl IntoResponse, AppError> {
  input.validate().map_err(AppError::from)?;

  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;
  let password_hash = state.hasher().hash(&input.password)?;
  let user = warden_core::repository::PgUserRepository
    .create(&mut conn, &input, &password_hash)
    .await?;

  Ok((StatusCode::CREATED, Json(SignupOutput { id: user.id.to_string() })))
}

pub async fn login_handler(
  State(state): State<AppState>,
  jar: CookieJar,
  Json(input): Json<SigninUser>,
) -> Result<impl IntoResponse, AppError> {
  input.validate().map_err(AppError::from)?;

  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;
  let user = warden_core::repository::PgUserRepository
    .find_by_email(&mut conn, &input.email)
    .await?
    .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

  let verified = user
    .password_hash
    .as_deref()
    .map(|hash| state.hasher().verify(&input.password, hash))
    .unwrap_or(false);
  if !verified {
    return Err(AppError::unauthorized("invalid credentials"));
  }

  let store = refresh_store(&state);
  let pair = store.make_token(&user.id.as_hex(), &input.fingerprint).await?;

  let mut headers = HeaderMap::new();
  headers.insert(axum::http::header::SET_COOKIE, refresh_cookie_header(&pair.refresh_token, pair.expires_in)?);
  Ok((headers, Json(TokenOutput { token: pair.access_token })))
}

pub async fn logout_handler(
  State(state): State<AppState>,
  jar: CookieJar,
  req_headers: HeaderMap,
  Json(body): Json<FingerprintBody>,
) -> Result<impl IntoResponse, AppError> {
  let refresh_token = extract_refresh_token(&jar, &req_headers)?;
  let store = refresh_store(&state);
  let revoked = store.revoke(&body.fingerprint, &refresh_token).await?;

  let mut headers = HeaderMap::new();
  headers.insert(axum::http::header::SET_COOKIE, clear_refresh_cookie_header()?);
  Ok((headers, Json(StatusOutput { status: revoked })))
}

pub async fn refresh_handler(
  State(state): State<AppState>,
  jar: CookieJar,
  req_headers: HeaderMap,
  Json(body): Json<FingerprintBody>,
) -> Result<impl IntoResponse, AppError> {
  let refresh_token = extract_refresh_token(&jar, &req_headers)?;
  let store = refresh_store(&state);
  let pair = store
    .rotate(&body.fingerprint, &refresh_token)
    .await
    .map_err(|_| AppError::unauthorized("invalid or expired refresh token"))?;

  let mut headers = HeaderMap::new();
  headers.insert(axum::http::header::SET_COOKIE, refresh_cookie_header(&pair.refresh_token, pair.expires_in)?);
  Ok((headers, Json(TokenOutput { token: pair.access_token })))
}

fn refresh_store(state: &AppState) -> RefreshStore<'_> {
  RefreshStore::new(
    state.cache(),
    state.lock(),
    state.jwt(),
    state.config().security.access_token_ttl_secs,
    state.config().security.refresh_token_ttl_secs,
  )
}

fn refresh_cookie_header(value: &str, max_age_secs: i64) -> Result<HeaderValue, AppError> {
  let raw = format!(
    "{REFRESH_COOKIE_NAME}={value}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={max_age_secs}"
  );
  HeaderValue::from_str(&raw).map_err(|e| AppError::new(warden_core::error::ErrorKind::AppError, e.to_string()))
}

fn clear_refresh_cookie_header() -> Result<HeaderValue, AppError> {
  let raw = format!("{REFRESH_COOKIE_NAME}=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0");
  HeaderValue::from_str(&raw).map_err(|e| AppError::new(warden_core::error::ErrorKind::AppError, e.to_string()))
}

fn extract_refresh_token(jar: &CookieJar, headers: &HeaderMap) -> Result<String, AppError> {
  if let Some(cookie) = jar.get(REFRESH_COOKIE_NAME) {
    return Ok(cookie.value().to_string());
  }
  let header = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| AppError::unauthorized("missing refresh token"))?;
  header
    .strip_prefix("Bearer ")
    .map(str::to_string)
    .ok_or_else(|| AppError::unauthorized("Authorization header is not a Bearer token"))
}
