//! Timetable service HTTP client

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use weekplan_core::TimetableSource;
use weekplan_domain::{
    PlanError, RawTimetable, Result, Secret, Subject, TimetableConfig, TimetableMode,
};

use super::types::{LoginResponse, SubjectsResponse};
use crate::http::{endpoint, ensure_success, HttpClient};

/// OAuth client id the timetable service expects from mobile clients
const LOGIN_CLIENT_ID: &str = "ANDR";

/// Client for a Bakaláři-style school timetable API
///
/// Logs in lazily with the password grant and keeps the bearer token for
/// the lifetime of the client. A token rejected mid-run triggers one fresh
/// login.
pub struct TimetableClient {
    http_client: HttpClient,
    base_url: String,
    username: Option<String>,
    password: Option<Secret>,
    mode: TimetableMode,
    token: Mutex<Option<String>>,
}

impl TimetableClient {
    /// Client for the timetable service in `config`; logs in on first use
    pub fn new(config: &TimetableConfig, http_client: HttpClient) -> Self {
        Self {
            http_client,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            mode: config.mode,
            token: Mutex::new(None),
        }
    }

    /// Exchange the configured credentials for a bearer token
    ///
    /// # Errors
    /// `PlanError::Config` when username or password is missing,
    /// `PlanError::Auth` when the service rejects them.
    pub async fn login(&self) -> Result<String> {
        let username = self
            .username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| PlanError::config("timetable username is not set"))?;
        let password = self
            .password
            .as_ref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| PlanError::config("timetable password is not set"))?;

        let url = endpoint(&self.base_url, &["login"])?;
        let form = [
            ("client_id", LOGIN_CLIENT_ID),
            ("grant_type", "password"),
            ("username", username),
            ("password", password.expose()),
        ];
        let response =
            self.http_client.send(self.http_client.request(Method::POST, url).form(&form)).await?;
        let response = ensure_success(response).await.map_err(|err| match err {
            PlanError::Api { status: 400, message } => {
                PlanError::auth(format!("Timetable login rejected: {message}"))
            }
            other => other,
        })?;
        let login: LoginResponse = decode(response).await?;

        info!("Logged in to timetable service");
        Ok(login.access_token)
    }

    /// Long-term timetable without one-off changes
    #[instrument(skip(self))]
    pub async fn permanent_timetable(&self) -> Result<RawTimetable> {
        let response = self.authorized_get(&["3", "timetable", "permanent"], &[]).await?;
        decode(ensure_success(response).await?).await
    }

    /// Timetable of the week containing `date`, including substitutions
    #[instrument(skip(self))]
    pub async fn actual_timetable(&self, date: NaiveDate) -> Result<RawTimetable> {
        let date = date.format("%Y-%m-%d").to_string();
        let response =
            self.authorized_get(&["3", "timetable", "actual"], &[("date", date.as_str())]).await?;
        decode(ensure_success(response).await?).await
    }

    /// Subject id to subject name and teacher
    pub async fn subjects(&self) -> Result<BTreeMap<String, Subject>> {
        let response = self.authorized_get(&["3", "subjects"], &[]).await?;
        let payload: SubjectsResponse = decode(ensure_success(response).await?).await?;

        let subjects: BTreeMap<String, Subject> =
            payload.subjects.into_iter().map(|record| record.into_entry()).collect();
        debug!(count = subjects.len(), "Fetched subject map");
        Ok(subjects)
    }

    async fn authorized_get(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Response> {
        let url = endpoint(&self.base_url, segments)?;

        let token = self.token().await?;
        let request =
            self.http_client.request(Method::GET, url.clone()).bearer_auth(&token).query(query);
        let response = self.http_client.send(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Timetable token rejected, logging in again");
        self.token.lock().await.take();
        let token = self.token().await?;
        let request = self.http_client.request(Method::GET, url).bearer_auth(&token).query(query);
        self.http_client.send(request).await
    }

    async fn token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.login().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl TimetableSource for TimetableClient {
    async fn fetch_timetable(&self, as_of: NaiveDate) -> Result<RawTimetable> {
        let timetable = match self.mode {
            TimetableMode::Actual => self.actual_timetable(as_of).await?,
            TimetableMode::Permanent => self.permanent_timetable().await?,
        };
        debug!(
            mode = %self.mode,
            days = timetable.days.len(),
            hours = timetable.hours.len(),
            "Fetched timetable"
        );
        Ok(timetable)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| PlanError::transport(format!("failed to read response body: {e}")))?;
    serde_json::from_slice(&body)
        .map_err(|e| PlanError::internal(format!("unexpected timetable service payload: {e}")))
}
