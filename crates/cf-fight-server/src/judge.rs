//! Read-only access to the Codeforces API.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cf_fight_core::{ProblemKey, Problemset, Submission};

use crate::error::{JudgeError, JudgeResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub handle: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub rank: Option<String>,
}

/// The three queries the service makes against the judge.
#[async_trait]
pub trait Judge: Send + Sync {
    /// `JudgeError::NotFound` when no user has this handle.
    async fn user_info(&self, handle: &str) -> JudgeResult<UserInfo>;

    /// Most recent first. `count = None` returns the full history.
    async fn user_submissions(&self, handle: &str, count: Option<u32>)
    -> JudgeResult<Vec<Submission>>;

    async fn problemset(&self) -> JudgeResult<Problemset>;
}

/// Outcome of looking a handle up. Lookup failures end up in `error`.
#[derive(Debug, Clone)]
pub struct HandleCheck {
    pub valid: bool,
    pub info: Option<UserInfo>,
    pub error: Option<String>,
}

pub async fn validate_handle(judge: &dyn Judge, handle: &str) -> HandleCheck {
    match judge.user_info(handle).await {
        Ok(info) => HandleCheck {
            valid: true,
            info: Some(info),
            error: None,
        },
        Err(e) => {
            debug!(handle, error = %e, "handle validation failed");
            HandleCheck {
                valid: false,
                info: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Keys of every problem the handle has an accepted submission for.
pub async fn solved_set(judge: &dyn Judge, handle: &str) -> JudgeResult<HashSet<ProblemKey>> {
    let submissions = judge.user_submissions(handle, None).await?;
    Ok(submissions.iter().filter_map(Submission::accepted_key).collect())
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    comment: Option<String>,
    result: Option<T>,
}

/// HTTP client for `https://codeforces.com/api`.
#[derive(Clone)]
pub struct CodeforcesClient {
    http: reqwest::Client,
    base_url: String,
}

impl CodeforcesClient {
    pub fn new(base_url: &str, timeout: Duration) -> JudgeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("cf-fight-server")
            .build()?;
        Ok(CodeforcesClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> JudgeResult<T> {
        let url = format!("{}/{}", self.base_url, method);
        let resp = self.http.get(&url).query(params).send().await?;
        let status = resp.status();

        // Failures come back as a 400 with the same envelope, so read the body
        // before looking at the status.
        let envelope: Envelope<T> = match resp.json().await {
            Ok(env) => env,
            Err(e) if e.is_timeout() => return Err(e.into()),
            Err(e) => {
                warn!(method, %status, error = %e, "unreadable judge response");
                return Err(JudgeError::Upstream(format!(
                    "Unexpected response from Codeforces ({})",
                    status
                )));
            }
        };

        if envelope.status != "OK" {
            return Err(JudgeError::Upstream(
                envelope
                    .comment
                    .unwrap_or_else(|| "Unknown Codeforces error".to_string()),
            ));
        }
        envelope
            .result
            .ok_or_else(|| JudgeError::Upstream(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl Judge for CodeforcesClient {
    async fn user_info(&self, handle: &str) -> JudgeResult<UserInfo> {
        let users: Vec<UserInfo> = self
            .call("user.info", &[("handles", handle.to_string())])
            .await
            .map_err(|e| match e {
                JudgeError::Upstream(message) if message.contains("not found") => {
                    JudgeError::NotFound {
                        handle: handle.to_string(),
                        message,
                    }
                }
                other => other,
            })?;
        users.into_iter().next().ok_or_else(|| JudgeError::NotFound {
            handle: handle.to_string(),
            message: format!("User {} not found", handle),
        })
    }

    async fn user_submissions(
        &self,
        handle: &str,
        count: Option<u32>,
    ) -> JudgeResult<Vec<Submission>> {
        let mut params = vec![("handle", handle.to_string())];
        if let Some(count) = count {
            params.push(("from", "1".to_string()));
            params.push(("count", count.to_string()));
        }
        self.call("user.status", &params).await
    }

    async fn problemset(&self) -> JudgeResult<Problemset> {
        self.call("problemset.problems", &[]).await
    }
}
