//! Wire types of the `acme.cert-manager.io/v1alpha1`-style webhook API.
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::solver::ChallengeRequest;

pub const API_VERSION: &str = "v1alpha1";
pub const CHALLENGE_PAYLOAD_KIND: &str = "ChallengePayload";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub uid: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// Subset of `metav1.Status` carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub message: String,
    pub reason: String,
    pub code: u16,
}

impl ChallengeResponse {
    pub fn success(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            success: true,
            status: None,
        }
    }

    pub fn failure(uid: impl Into<String>, err: &SolverError) -> Self {
        let (reason, code) = match err {
            SolverError::Config(_) | SolverError::Validation(_) => ("BadRequest", 400),
            SolverError::NotInitialized | SolverError::Cancelled => ("ServiceUnavailable", 503),
            _ => ("InternalError", 500),
        };
        Self {
            uid: uid.into(),
            success: false,
            status: Some(Status {
                status: "Failure".to_string(),
                message: err.to_string(),
                reason: reason.to_string(),
                code,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    pub kind: String,
    pub api_version: String,
    pub group_version: String,
    pub resources: Vec<ApiResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub name: String,
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: String,
    pub verbs: Vec<String>,
}

impl ApiResource {
    pub fn for_solver(name: &str) -> Self {
        Self {
            name: name.to_string(),
            singular_name: name.to_string(),
            namespaced: false,
            kind: CHALLENGE_PAYLOAD_KIND.to_string(),
            verbs: vec!["create".to_string()],
        }
    }
}
