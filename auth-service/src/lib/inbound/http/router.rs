use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::signup::signup;
use super::handlers::update_profile::update_profile;
use super::handlers::verify_email::missing_token;
use super::handlers::verify_email::verify_email;
use super::middleware::authenticate as auth_middleware;
use super::middleware::expose_error_details;
use crate::domain::user::ports::AuthServicePort;

/// Largest request body accepted by any route.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

pub struct AppState<S: AuthServicePort> {
    pub auth_service: Arc<S>,
    /// Error bodies carry `error` and `stack` when set.
    pub dev_mode: bool,
}

impl<S: AuthServicePort> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
            dev_mode: self.dev_mode,
        }
    }
}

pub fn create_router<S: AuthServicePort>(auth_service: Arc<S>, dev_mode: bool) -> Router {
    let state = AppState {
        auth_service,
        dev_mode,
    };

    let public_routes = Router::new()
        .route("/api/auth/signup", post(signup::<S>))
        .route("/api/auth/login", post(login::<S>))
        .route("/api/auth/verify-email", get(missing_token))
        .route("/api/auth/verify-email/:token", get(verify_email::<S>));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/update-profile", put(update_profile::<S>))
        .route("/api/auth/change-password", put(change_password::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    // Only the route template is logged. Headers carry bearer tokens and
    // the verify-email path carries the verification token.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                route = route_template(request),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                route = route_template(request),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            expose_error_details::<S>,
        ))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn route_template(request: &Request<Body>) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched")
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http::header;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::user::models::AuthenticatedSession;
    use crate::domain::user::models::ChangePasswordCommand;
    use crate::domain::user::models::LoginCommand;
    use crate::domain::user::models::SignupCommand;
    use crate::domain::user::models::UpdateProfileCommand;
    use crate::domain::user::models::User;
    use crate::domain::user::models::UserId;
    use crate::user::errors::AuthError;

    /// Fails every call with the same error.
    struct FailingService(AuthError);

    #[async_trait]
    impl AuthServicePort for FailingService {
        async fn signup(&self, _command: SignupCommand) -> Result<User, AuthError> {
            Err(self.0.clone())
        }

        async fn login(&self, _command: LoginCommand) -> Result<AuthenticatedSession, AuthError> {
            Err(self.0.clone())
        }

        async fn verify_email(&self, _token: &str) -> Result<AuthenticatedSession, AuthError> {
            Err(self.0.clone())
        }

        async fn authenticate(&self, _authorization: Option<&str>) -> Result<User, AuthError> {
            Err(self.0.clone())
        }

        async fn update_profile(
            &self,
            _id: &UserId,
            _command: UpdateProfileCommand,
        ) -> Result<User, AuthError> {
            Err(self.0.clone())
        }

        async fn change_password(
            &self,
            _id: &UserId,
            _command: ChangePasswordCommand,
        ) -> Result<(), AuthError> {
            Err(self.0.clone())
        }
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn verify_request() -> Request<Body> {
        Request::get("/api/auth/verify-email/abc")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_is_generic_outside_development() {
        let service = Arc::new(FailingService(AuthError::DatabaseError(
            "connection refused".to_string(),
        )));

        let (status, body) = call(create_router(service, false), verify_request()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
        assert!(body.get("error").is_none());
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_development_exposes_error_and_stack() {
        let service = Arc::new(FailingService(AuthError::DatabaseError(
            "connection refused".to_string(),
        )));

        let (status, body) = call(create_router(service, true), verify_request()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal Server Error");
        assert_eq!(body["error"], "Database error: connection refused");
        assert!(body["stack"].as_str().unwrap().contains("DatabaseError"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_request_logs_name_the_route_not_the_token() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let service = Arc::new(FailingService(AuthError::InvalidVerificationToken));
        let request = Request::get("/api/auth/verify-email/9f1c2e7a5b3d4c6e")
            .body(Body::empty())
            .unwrap();
        call(create_router(service, false), request).await;

        let output = logs.contents();
        assert!(output.contains("/api/auth/verify-email/:token"), "{}", output);
        assert!(!output.contains("9f1c2e7a5b3d4c6e"), "{}", output);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_before_the_service() {
        let service = Arc::new(FailingService(AuthError::DatabaseError(
            "unreachable".to_string(),
        )));
        let oversized = format!("{{\"fullName\": \"{}\"}}", "a".repeat(MAX_BODY_BYTES));
        let request = Request::post("/api/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(oversized))
            .unwrap();

        let (status, body) = call(create_router(service, false), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Error while parsing signup request body");
    }

    #[tokio::test]
    async fn test_protected_route_stops_at_middleware() {
        let service = Arc::new(FailingService(AuthError::Unauthenticated(
            "Invalid or expired token".to_string(),
        )));

        let request = Request::put("/api/auth/change-password")
            .header(header::AUTHORIZATION, "Bearer expired")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = call(create_router(service, false), request).await;

        // Authentication runs before body validation
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token");
    }
}
