//! REST document-store adapter.
//!
//! Layout on the server, relative to `{base}/v1[/projects/{project}]`:
//!
//! | Path | Document |
//! |------|----------|
//! | `users/{uid}/days/{day}` | day stats: `total_ml`, `goal_ml` |
//! | `users/{uid}/days/{day}/intakes/{id}` | one intake event |
//! | `users/{uid}/days?since={day}` | stats of every day from `since` |
//! | `users/{uid}/settings/reminders` | reminder settings |
//!
//! `PATCH` merges into a document and creates it when absent. A `PATCH`
//! carrying `increment_ml` adds to `total_ml` server-side.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RemoteError, RemoteErrorKind, RemoteResult, RemoteStore, with_index_fallback};
use crate::error::Result;
use crate::model::{
    DEFAULT_GOAL_ML, DailyRecord, DayKey, DayStats, IntakeEvent, ReminderSettings, UserId,
};

const USER_AGENT: &str = concat!("hydrosync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct StatsDoc {
    #[serde(default)]
    total_ml: u32,
    #[serde(default = "default_goal")]
    goal_ml: u32,
}

const fn default_goal() -> u32 {
    DEFAULT_GOAL_ML
}

#[derive(Debug, Default, Serialize)]
struct StatsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    increment_ml: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_ml: Option<u32>,
    goal_ml: u32,
}

#[derive(Debug, Deserialize)]
struct Documents<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

/// `RemoteStore` over HTTP with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    project: Option<String>,
    api_key: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project: None,
            api_key,
        })
    }

    #[must_use]
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project.filter(|p| !p.trim().is_empty());
        self
    }

    fn user_url(&self, user: &UserId) -> String {
        let uid = urlencoding::encode(user.as_str());
        match &self.project {
            Some(project) => format!(
                "{}/v1/projects/{}/users/{uid}",
                self.base_url,
                urlencoding::encode(project)
            ),
            None => format!("{}/v1/users/{uid}", self.base_url),
        }
    }

    fn day_url(&self, user: &UserId, day: DayKey) -> String {
        format!("{}/days/{day}", self.user_url(user))
    }

    fn settings_url(&self, user: &UserId) -> String {
        format!("{}/settings/reminders", self.user_url(user))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        label: &str,
    ) -> RemoteResult<reqwest::Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| transport_error(&err, label))?;
        debug!(label, status = %response.status(), "remote response");
        Ok(response)
    }

    /// GET a document; `None` on 404.
    async fn get_optional<T: DeserializeOwned>(
        &self,
        url: &str,
        label: &str,
    ) -> RemoteResult<Option<T>> {
        let response = self.send(self.client.get(url), label).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_json_response(response, label).await.map(Some)
    }

    async fn list<T: DeserializeOwned>(&self, url: &str, label: &str) -> RemoteResult<Vec<T>> {
        let response = self.send(self.client.get(url), label).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let docs: Documents<T> = parse_json_response(response, label).await?;
        Ok(docs.documents)
    }

    async fn patch_json<T: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        payload: &T,
        label: &str,
    ) -> RemoteResult<()> {
        let response = self.send(self.client.patch(url).json(payload), label).await?;
        expect_success(&response, label)
    }

    /// Intake documents are keyed by event id, so a replay overwrites.
    async fn put_intake(&self, user: &UserId, day: DayKey, event: &IntakeEvent) -> RemoteResult<()> {
        let url = format!(
            "{}/intakes/{}",
            self.day_url(user, day),
            urlencoding::encode(&event.id)
        );
        let response = self.send(self.client.put(&url).json(event), "intake").await?;
        expect_success(&response, "intake")
    }

    async fn patch_stats(&self, user: &UserId, day: DayKey, patch: &StatsPatch) -> RemoteResult<()> {
        self.patch_json(&self.day_url(user, day), patch, "day stats")
            .await
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn fetch_day(&self, user: &UserId, day: DayKey) -> RemoteResult<Option<DailyRecord>> {
        let day_url = self.day_url(user, day);
        let Some(stats) = self.get_optional::<StatsDoc>(&day_url, "day stats").await? else {
            return Ok(None);
        };

        let ordered_url = format!("{day_url}/intakes?order=occurred_at");
        let unordered_url = format!("{day_url}/intakes");
        let history = with_index_fallback(
            "intakes",
            self.list::<IntakeEvent>(&ordered_url, "ordered intakes"),
            self.list::<IntakeEvent>(&unordered_url, "intakes"),
            |items: &mut Vec<IntakeEvent>| items.sort_by_key(|e| e.occurred_at),
        )
        .await?;

        Ok(Some(DailyRecord {
            consumed_ml: stats.total_ml,
            goal_ml: stats.goal_ml,
            history,
            day_key: day,
        }))
    }

    async fn put_day(&self, user: &UserId, record: &DailyRecord) -> RemoteResult<()> {
        for event in &record.history {
            self.put_intake(user, record.day_key, event).await?;
        }
        self.patch_stats(
            user,
            record.day_key,
            &StatsPatch {
                total_ml: Some(record.consumed_ml),
                goal_ml: record.goal_ml,
                ..StatsPatch::default()
            },
        )
        .await
    }

    async fn add_intake(
        &self,
        user: &UserId,
        day: DayKey,
        event: &IntakeEvent,
        goal_ml: u32,
    ) -> RemoteResult<()> {
        self.put_intake(user, day, event).await?;
        self.patch_stats(
            user,
            day,
            &StatsPatch {
                increment_ml: Some(event.amount_ml),
                goal_ml,
                ..StatsPatch::default()
            },
        )
        .await
    }

    async fn reset_day(&self, user: &UserId, day: DayKey, goal_ml: u32) -> RemoteResult<()> {
        let url = format!("{}/intakes", self.day_url(user, day));
        let response = self.send(self.client.delete(&url), "delete intakes").await?;
        if response.status() != reqwest::StatusCode::NOT_FOUND {
            expect_success(&response, "delete intakes")?;
        }

        self.patch_stats(
            user,
            day,
            &StatsPatch {
                total_ml: Some(0),
                goal_ml,
                ..StatsPatch::default()
            },
        )
        .await
    }

    async fn set_goal(&self, user: &UserId, day: DayKey, goal_ml: u32) -> RemoteResult<()> {
        self.patch_stats(
            user,
            day,
            &StatsPatch {
                goal_ml,
                ..StatsPatch::default()
            },
        )
        .await
    }

    async fn load_settings(&self, user: &UserId) -> RemoteResult<ReminderSettings> {
        let settings = self
            .get_optional::<ReminderSettings>(&self.settings_url(user), "settings")
            .await?;
        Ok(settings.unwrap_or_default())
    }

    async fn save_settings(&self, user: &UserId, settings: &ReminderSettings) -> RemoteResult<()> {
        self.patch_json(&self.settings_url(user), settings, "settings")
            .await
    }

    async fn day_stats(&self, user: &UserId, since: DayKey) -> RemoteResult<Vec<DayStats>> {
        let base = format!("{}/days?since={since}", self.user_url(user));
        let ordered_url = format!("{base}&order=desc");
        with_index_fallback(
            "day_stats",
            self.list::<DayStats>(&ordered_url, "ordered day stats"),
            self.list::<DayStats>(&base, "day stats"),
            |items: &mut Vec<DayStats>| items.sort_by(|a, b| b.day_key.cmp(&a.day_key)),
        )
        .await
    }
}

fn transport_error(err: &reqwest::Error, label: &str) -> RemoteError {
    if err.is_timeout() {
        RemoteError::new(
            RemoteErrorKind::Timeout,
            format!("{label} request timed out: {err}"),
        )
    } else if err.is_connect() || err.is_request() {
        RemoteError::unavailable(format!("{label} request failed: {err}"))
    } else if err.is_decode() {
        RemoteError::invalid_response(format!("{label} body: {err}"))
    } else {
        RemoteError::new(
            RemoteErrorKind::Other,
            format!("{label} request failed: {err}"),
        )
    }
}

fn status_error(status: reqwest::StatusCode, label: &str) -> RemoteError {
    use reqwest::StatusCode;

    let message = format!("{label} failed: HTTP {status}");
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::unauthenticated(message),
        StatusCode::FORBIDDEN => RemoteError::permission_denied(message),
        StatusCode::NOT_FOUND => RemoteError::not_found(message),
        StatusCode::PRECONDITION_FAILED => RemoteError::failed_precondition(message),
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => RemoteError::unavailable(message),
        _ => RemoteError::new(RemoteErrorKind::Other, message),
    }
}

fn expect_success(response: &reqwest::Response, label: &str) -> RemoteResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(status_error(response.status(), label))
    }
}

async fn parse_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
    label: &str,
) -> RemoteResult<T> {
    expect_success(&response, label)?;
    response
        .json::<T>()
        .await
        .map_err(|err| RemoteError::invalid_response(format!("{label} parse failed: {err}")))
}
