use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Method,
    http::Request,
    http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use clap::Parser;
use jm_common::directory::{DirectorySnapshot, InMemoryDirectory};
use jm_common::matching::{MatchingConfig, MatchingEngine};
use jm_common::service::MatchService;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod auth;
pub mod error;
pub mod handlers;

use auth::{AuthConfig, AuthMode, RECRUITER_HEADER};
use error::ApiError;
use handlers::{health, matches};

const SHUTDOWN_DRAIN_GRACE: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "jm-api", about = "HTTP API for candidate/job matching")]
pub struct Cli {
    /// Snapshot file with `{"candidates": [...], "jobs": [...]}`
    #[arg(long, env = "JM_DATA_PATH")]
    data_path: PathBuf,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// API key for X-API-Key authentication
    #[arg(long, env = "JM_API_KEY")]
    api_key: Option<String>,

    /// Honour the X-Recruiter-Id header in api_key mode. Every holder of the
    /// shared key can then act as any recruiter, so candidate search ownership
    /// is only as strong as the key distribution. Without it, candidate search
    /// needs AUTH_MODE=jwt.
    #[arg(long, env = "JM_TRUST_RECRUITER_HEADER")]
    trust_recruiter_header: bool,

    /// Authentication mode: api_key | jwt
    #[arg(long, env = "AUTH_MODE", default_value = "api_key", value_enum)]
    auth_mode: AuthMode,

    /// HS256 secret for AUTH_MODE=jwt
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "JM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "JM_CORS_ORIGINS must list explicit origins when credentials are enabled".into(),
            ));
        }

        let auth = AuthConfig {
            mode: cli.auth_mode,
            api_key: cli.api_key,
            jwt_secret: cli.jwt_secret,
            trust_recruiter_header: cli.trust_recruiter_header,
        };

        match auth.mode {
            AuthMode::ApiKey if auth.api_key.is_none() => {
                return Err(ApiError::BadRequest(
                    "JM_API_KEY is required when AUTH_MODE=api_key".into(),
                ));
            }
            AuthMode::Jwt if auth.jwt_secret.is_none() => {
                return Err(ApiError::BadRequest(
                    "JWT_SECRET is required when AUTH_MODE=jwt".into(),
                ));
            }
            AuthMode::ApiKey if auth.trust_recruiter_header => {
                tracing::warn!("recruiter identity taken from the X-Recruiter-Id header");
            }
            _ => {}
        }

        Ok(Self {
            data_path: cli.data_path,
            port: cli.port,
            cors_origins,
            auth,
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            data_path: PathBuf::from("snapshot.json"),
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
            auth,
        }
    }
}

pub type Service = MatchService<InMemoryDirectory>;

pub struct AppState {
    pub service: Arc<Service>,
    pub config: AppConfig,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static(RECRUITER_HEADER),
        ])
        .allow_credentials(true)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/match-score", post(matches::match_score))
        .route("/find-jobs", get(matches::find_jobs))
        .route("/find-candidates", get(matches::find_candidates))
        .route("/model/refit", post(matches::refit));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

/// Fixture used by handler and router tests: two candidates, three jobs
/// (one closed), all owned by recruiter `r-1` except `job-ops`.
pub fn test_snapshot() -> DirectorySnapshot {
    const RAW: &str = r#"{
        "candidates": [
            {
                "id": "cand-rust",
                "name": "Ada",
                "summary": "Rust backend engineer building payment systems",
                "skills": [
                    {"name": "Rust", "proficiency": "expert"},
                    {"name": "PostgreSQL", "proficiency": "advanced"}
                ],
                "experience": [
                    {"title": "Senior Engineer", "domain_tags": ["fintech"], "start": "2015-01", "end": "2023-12"}
                ],
                "location": {"city": "Austin", "region": "TX", "country": "USA"}
            },
            {
                "id": "cand-design",
                "name": "Grace",
                "summary": "Product designer",
                "skills": [{"name": "Figma", "proficiency": "advanced"}],
                "location": {"city": "Berlin", "region": "BE", "country": "Germany"}
            }
        ],
        "jobs": [
            {
                "id": "job-rust",
                "title": "Senior Rust Engineer",
                "company": "Payments Inc",
                "recruiter_id": "r-1",
                "description": "Build payment systems in Rust",
                "required_skills": [{"name": "rust", "min_proficiency": "advanced"}, {"name": "postgres"}],
                "experience": {"level": "senior"},
                "domain_tags": ["fintech"],
                "location": {"city": "Austin", "region": "TX", "country": "USA"},
                "remote_option": "hybrid"
            },
            {
                "id": "job-closed",
                "title": "Rust Engineer",
                "recruiter_id": "r-1",
                "required_skills": [{"name": "rust"}],
                "remote_option": "remote_only",
                "status": "closed"
            },
            {
                "id": "job-ops",
                "title": "Site Reliability Engineer",
                "recruiter_id": "r-2",
                "required_skills": [{"name": "kubernetes"}, {"name": "terraform"}],
                "remote_option": "remote_only"
            }
        ]
    }"#;
    DirectorySnapshot::from_json(RAW).unwrap_or_default()
}

pub fn test_state(api_key: &str) -> SharedState {
    let auth = AuthConfig {
        mode: AuthMode::ApiKey,
        api_key: Some(api_key.to_string()),
        jwt_secret: None,
        trust_recruiter_header: true,
    };
    let directory = Arc::new(InMemoryDirectory::new(test_snapshot()));
    let engine = MatchingEngine::new(MatchingConfig::default());

    Arc::new(AppState {
        service: Arc::new(MatchService::new(engine, directory)),
        config: AppConfig::for_tests(auth),
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

pub async fn run() -> Result<(), ApiError> {
    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;

    let directory = Arc::new(InMemoryDirectory::load(&config.data_path)?);
    let engine = MatchingEngine::new(MatchingConfig::from_env());
    let service = Arc::new(MatchService::new(engine, directory));
    if let Err(err) = service.refit_model() {
        tracing::warn!(error = %err, "starting without a fitted semantic model");
    }

    let state = Arc::new(AppState {
        service,
        config: config.clone(),
        readiness: Arc::new(AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, auth_mode = ?config.auth.mode, "jm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);

    // Give load balancers a brief window to observe /readyz as not ready
    // before axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["jm-api", "--data-path", "data.json"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static("x-request-id"),
                MakeRequestUuid::default(),
            ));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn config_rejects_wildcard_cors_and_missing_secrets() {
        let wildcard = AppConfig::from_cli(cli(&["--api-key", "k", "--cors-origins", "*"]));
        assert!(matches!(wildcard, Err(ApiError::BadRequest(_))));

        let jwt = AppConfig::from_cli(cli(&["--auth-mode", "jwt"]));
        assert!(matches!(jwt, Err(ApiError::BadRequest(_))));

        let ok = AppConfig::from_cli(cli(&[
            "--api-key",
            "k",
            "--cors-origins",
            "http://a.test, http://b.test",
        ]))
        .unwrap();
        assert_eq!(ok.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(!ok.auth.trust_recruiter_header);

        let trusted =
            AppConfig::from_cli(cli(&["--api-key", "k", "--trust-recruiter-header"])).unwrap();
        assert!(trusted.auth.trust_recruiter_header);
    }

    #[test]
    fn fixture_snapshot_parses() {
        let snapshot = test_snapshot();
        assert_eq!(snapshot.candidates.len(), 2);
        assert_eq!(snapshot.jobs.len(), 3);
    }
}
