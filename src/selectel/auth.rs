//! Token acquisition for the Domains API.
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::config::Credentials;
use crate::error::ApiError;

/// Header the identity service returns the issued token in.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Produce the value for the `X-Auth-Token` header.
///
/// A static token is used as is. Password credentials are exchanged with the
/// identity service (Keystone v3) for a token scoped to `project_id`.
pub async fn obtain_token(
    http: &Client,
    auth_url: &str,
    credentials: &Credentials,
) -> Result<String, ApiError> {
    let (username, password, account_id, project_id) = match credentials {
        Credentials::Token(token) => return Ok(token.clone()),
        Credentials::Password {
            username,
            password,
            account_id,
            project_id,
        } => (username, password, account_id, project_id),
    };

    let body = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": username,
                        "domain": { "name": account_id },
                        "password": password,
                    }
                }
            },
            "scope": {
                "project": { "id": project_id }
            }
        }
    });

    let url = format!("{}/auth/tokens", auth_url.trim_end_matches('/'));
    debug!(%url, username = %username, project_id = %project_id, "requesting keystone token");
    let res = http.post(url).json(&body).send().await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let token = res
        .headers()
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::Auth(format!("identity response has no {SUBJECT_TOKEN_HEADER} header"))
        })?;

    Ok(token.to_string())
}
