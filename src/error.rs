// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::selectel::types::RecordType;

/// Failure talking to the remote DNS API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("listing did not advance: next offset {next_offset} after offset {offset}")]
    Pagination { offset: usize, next_offset: usize },
}

/// Errors produced while resolving zones/rrsets or mutating them.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("zone {zone} not found")]
    ZoneNotFound { zone: String },

    #[error("rrset {name} of type {rtype} not found")]
    RrsetNotFound { name: String, rtype: RecordType },

    #[error("convert {name} to unicode: {message}")]
    Idna { name: String, message: String },

    #[error("{stage}: {source}")]
    Api {
        stage: &'static str,
        #[source]
        source: ApiError,
    },

    /// Wraps a lower-level error with the step of present/cleanup that failed.
    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<DnsError>,
    },
}

impl DnsError {
    pub fn api(stage: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| DnsError::Api { stage, source }
    }

    pub fn stage(stage: &'static str) -> impl FnOnce(DnsError) -> Self {
        move |source| DnsError::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// Innermost error, with stage wrappers peeled off.
    pub fn root(&self) -> &DnsError {
        match self {
            DnsError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_zone_not_found(&self) -> bool {
        matches!(self.root(), DnsError::ZoneNotFound { .. })
    }

    pub fn is_rrset_not_found(&self) -> bool {
        matches!(self.root(), DnsError::RrsetNotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("solver config is absent")]
    Absent,

    #[error("unmarshal config: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("secret name not setup")]
    SecretNameNotSetup,

    #[error("invalid TTL, TTL ({ttl}) must be greater than or equal to {min}")]
    InvalidTtl { ttl: u32, min: u32 },

    #[error("invalid HTTP timeout, must be at least 1 second")]
    InvalidHttpTimeout,

    #[error("build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("kubernetes client config: {0}")]
    ClientConfig(String),

    #[error("secret {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("fetch secret: {0}")]
    Api(#[from] ApiError),

    #[error("decode secret entry {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// Top-level error returned by a solver to the host controller.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver is not initialized")]
    NotInitialized,

    #[error("solver is already initialized")]
    AlreadyInitialized,

    #[error("load config: {0}")]
    Config(#[from] ConfigError),

    #[error("getting secret: {0}")]
    Secret(#[from] SecretError),

    #[error("validate credentials: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    #[error("present: {0}")]
    Present(#[source] DnsError),

    #[error("cleanup: {0}")]
    CleanUp(#[source] DnsError),

    #[error("operation cancelled")]
    Cancelled,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponseBody {
    pub error: String,
}

/// Errors surfaced by the webhook HTTP layer itself. Solver failures are not
/// HTTP errors; they travel inside the challenge response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponseBody { error: msg });
        (status, body).into_response()
    }
}
