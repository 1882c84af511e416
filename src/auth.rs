use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use futures::future::{ready, LocalBoxFuture, Ready};
use serde_json::json;

use crate::db::models::{NewSession, NewUser, Session};
use crate::db::repository;
use crate::error::{ApiError, ApiResult};
use crate::models::{CredentialsRequest, SessionResponse};
use crate::AppState;

pub const SESSION_COOKIE: &str = "session_token";

const PROTECTED_PREFIX: &str = "/admin";
const LOGIN_PATH: &str = "/login";

// --- password hashing ---

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {}", err)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

// --- guard decision ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Send to the login page, recording where the request came from.
    RedirectToLogin { from: String },
    /// Already signed in; send away from the login page.
    RedirectToAdmin,
}

pub fn guard_decision(path: &str, has_session: bool) -> GuardDecision {
    if path.starts_with(PROTECTED_PREFIX) && !has_session {
        GuardDecision::RedirectToLogin {
            from: path.to_string(),
        }
    } else if path.starts_with(LOGIN_PATH) && has_session {
        GuardDecision::RedirectToAdmin
    } else {
        GuardDecision::Proceed
    }
}

fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

fn lookup_session(req: &HttpRequest) -> Option<Session> {
    let token = session_token(req)?;
    let state = req.app_data::<web::Data<AppState>>()?;
    let mut conn = match state.pool.get() {
        Ok(conn) => conn,
        Err(err) => {
            // Fails closed: an unreachable pool means no session.
            log::warn!("session lookup: pool unavailable: {}", err);
            return None;
        }
    };
    match repository::find_valid_session(&mut conn, &token, Utc::now().naive_utc()) {
        Ok(session) => session,
        Err(err) => {
            log::warn!("session lookup failed, treating as signed out: {}", err);
            None
        }
    }
}

// --- guard middleware ---

/// Redirect layer over the protected prefix: `/admin` paths without a valid
/// session bounce to `/login?redirected_from=...`, and `/login` with a valid
/// session bounces to `/admin`. Every other path passes through untouched.
pub struct SessionGuard;

impl<S, B> Transform<S, ServiceRequest> for SessionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = SessionGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionGuardMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let path = req.path().to_string();
            let guarded = path.starts_with(PROTECTED_PREFIX) || path.starts_with(LOGIN_PATH);
            let decision = if guarded {
                let has_session = lookup_session(req.request()).is_some();
                guard_decision(&path, has_session)
            } else {
                GuardDecision::Proceed
            };

            match decision {
                GuardDecision::Proceed => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body),
                GuardDecision::RedirectToLogin { from } => {
                    let location = format!("{}?redirected_from={}", LOGIN_PATH, from);
                    let response = HttpResponse::Found()
                        .insert_header((header::LOCATION, location))
                        .finish();
                    Ok(req.into_response(response).map_into_right_body())
                }
                GuardDecision::RedirectToAdmin => {
                    let response = HttpResponse::Found()
                        .insert_header((header::LOCATION, PROTECTED_PREFIX))
                        .finish();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

// --- admin API extractor ---

/// Valid session required by the JSON admin endpoints; rejects with 401
/// instead of redirecting.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user_id: i32,
    pub token: String,
}

impl FromRequest for AdminSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = lookup_session(req).map(|session| AdminSession {
            user_id: session.user_id,
            token: session.token,
        });
        ready(session.ok_or(ApiError::Unauthorized))
    }
}

// --- handlers ---

fn validate_credentials(body: &CredentialsRequest) -> ApiResult<()> {
    if !body.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if body.password.len() < 6 {
        return Err(ApiError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

fn open_session(
    conn: &mut crate::db::connection::PgPooledConnection,
    user_id: i32,
    ttl_hours: i64,
) -> ApiResult<Session> {
    let session = repository::create_session(
        conn,
        NewSession {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            expires_at: Utc::now().naive_utc() + Duration::hours(ttl_hours),
        },
    )?;
    Ok(session)
}

fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    validate_credentials(&body)?;
    let conn = &mut state.pool.get()?;
    if repository::find_user_by_email(conn, &body.email)?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }
    let user = repository::create_user(
        conn,
        NewUser {
            email: body.email.clone(),
            password_hash: hash_password(&body.password)?,
        },
    )?;
    let session = open_session(conn, user.id, state.session_ttl_hours)?;
    log::info!("new admin user {} ({})", user.id, user.email);
    Ok(HttpResponse::Created()
        .cookie(session_cookie(&session.token))
        .json(SessionResponse {
            token: session.token,
            user_id: session.user_id,
            expires_at: session.expires_at,
        }))
}

pub async fn signin(
    state: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let conn = &mut state.pool.get()?;
    let user = repository::find_user_by_email(conn, &body.email)?;
    let user = match user {
        Some(user) if verify_password(&body.password, &user.password_hash) => user,
        _ => return Err(ApiError::Unauthorized),
    };
    let session = open_session(conn, user.id, state.session_ttl_hours)?;
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&session.token))
        .json(SessionResponse {
            token: session.token,
            user_id: session.user_id,
            expires_at: session.expires_at,
        }))
}

pub async fn signout(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    if let Some(token) = session_token(&req) {
        let conn = &mut state.pool.get()?;
        repository::delete_session(conn, &token)?;
    }
    let mut removal = session_cookie("");
    removal.make_removal();
    Ok(HttpResponse::Ok()
        .cookie(removal)
        .json(json!({ "signed_out": true })))
}

pub async fn current_session(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let session = match session_token(&req) {
        Some(token) => {
            let conn = &mut state.pool.get()?;
            repository::find_valid_session(conn, &token, Utc::now().naive_utc())?
        }
        None => None,
    };
    match session {
        Some(session) => Ok(HttpResponse::Ok().json(json!({
            "authenticated": true,
            "user_id": session.user_id,
            "expires_at": session.expires_at,
        }))),
        None => Ok(HttpResponse::Ok().json(json!({ "authenticated": false }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_path_without_session_redirects_to_login() {
        assert_eq!(
            guard_decision("/admin/produtos", false),
            GuardDecision::RedirectToLogin {
                from: "/admin/produtos".to_string()
            }
        );
    }

    #[test]
    fn protected_path_with_session_proceeds() {
        assert_eq!(guard_decision("/admin", true), GuardDecision::Proceed);
    }

    #[test]
    fn login_path_with_session_redirects_to_admin() {
        assert_eq!(guard_decision("/login", true), GuardDecision::RedirectToAdmin);
    }

    #[test]
    fn login_path_without_session_proceeds() {
        assert_eq!(guard_decision("/login", false), GuardDecision::Proceed);
    }

    #[test]
    fn public_paths_are_untouched_either_way() {
        assert_eq!(guard_decision("/api/catalog", false), GuardDecision::Proceed);
        assert_eq!(guard_decision("/api/catalog", true), GuardDecision::Proceed);
        assert_eq!(guard_decision("/", false), GuardDecision::Proceed);
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }
}
