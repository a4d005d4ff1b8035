// src/api/challenge.rs
use axum::{Extension, Json, extract::Path};
use tracing::{error, info};

use super::types::{
    API_VERSION, ApiResource, ApiResourceList, CHALLENGE_PAYLOAD_KIND, ChallengePayload,
    ChallengeResponse,
};
use crate::SharedState;
use crate::error::AppError;
use crate::solver::ChallengeAction;

// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

// GET /apis/{group}/v1alpha1
pub async fn api_resources(
    Path(group): Path<String>,
    Extension(state): Extension<SharedState>,
) -> Result<Json<ApiResourceList>, AppError> {
    check_group(&state, &group)?;

    Ok(Json(ApiResourceList {
        kind: "APIResourceList".to_string(),
        api_version: "v1".to_string(),
        group_version: format!("{group}/{API_VERSION}"),
        resources: state
            .solvers
            .iter()
            .map(|s| ApiResource::for_solver(s.name()))
            .collect(),
    }))
}

// POST /apis/{group}/v1alpha1/{solver}
pub async fn solve(
    Path((group, solver_name)): Path<(String, String)>,
    Extension(state): Extension<SharedState>,
    Json(payload): Json<ChallengePayload>,
) -> Result<Json<ChallengePayload>, AppError> {
    check_group(&state, &group)?;
    let solver = state
        .solver(&solver_name)
        .ok_or_else(|| AppError::not_found(format!("solver {solver_name} is not registered")))?;
    let request = payload
        .request
        .ok_or_else(|| AppError::bad_request("challenge payload has no request"))?;

    let result = match request.action {
        ChallengeAction::Present => solver.present(&request).await,
        ChallengeAction::CleanUp => solver.cleanup(&request).await,
    };

    let response = match result {
        Ok(()) => {
            info!(uid = %request.uid, action = ?request.action, solver = %solver_name, "challenge handled");
            ChallengeResponse::success(&request.uid)
        }
        Err(err) => {
            error!(uid = %request.uid, action = ?request.action, solver = %solver_name, "challenge failed: {err}");
            ChallengeResponse::failure(&request.uid, &err)
        }
    };

    Ok(Json(ChallengePayload {
        api_version: Some(format!("{group}/{API_VERSION}")),
        kind: Some(CHALLENGE_PAYLOAD_KIND.to_string()),
        request: None,
        response: Some(response),
    }))
}

fn check_group(state: &SharedState, group: &str) -> Result<(), AppError> {
    if group != state.group_name {
        return Err(AppError::not_found(format!("api group {group} is not served")));
    }
    Ok(())
}
