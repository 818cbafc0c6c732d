//! Google Calendar v3 and Tasks v1 client

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};
use url::Url;
use weekplan_core::CalendarWorkspace;
use weekplan_domain::{
    CalendarEvent, CalendarSummary, GoogleConfig, NewTask, PlanError, ProposedEvent, Result, Task,
    TaskList,
};

use super::auth::GoogleAuth;
use super::types::{
    CalendarListPage, EventsPage, GoogleEvent, GoogleTask, InsertedEvent, TaskListsPage, TasksPage,
};
use crate::http::{endpoint, ensure_success, HttpClient};

/// Largest page the Calendar API returns for an events listing
const EVENTS_PAGE_SIZE: u32 = 250;

/// Largest page the Tasks API returns
const TASKS_PAGE_SIZE: u32 = 100;

/// Calendar and task workspace backed by the Google APIs
pub struct GoogleWorkspaceClient {
    http_client: HttpClient,
    auth: Arc<GoogleAuth>,
    calendar_api_base: String,
    tasks_api_base: String,
}

impl GoogleWorkspaceClient {
    /// Client for the API bases in `config`, authorized through `auth`
    pub fn new(http_client: HttpClient, auth: Arc<GoogleAuth>, config: &GoogleConfig) -> Self {
        Self {
            http_client,
            auth,
            calendar_api_base: config.calendar_api_base.clone(),
            tasks_api_base: config.tasks_api_base.clone(),
        }
    }

    /// Send an authorized request, refreshing the token once on 401
    async fn send_authorized<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let token = self.auth.access_token().await?;
        let response = self.http_client.send(build(&token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Google rejected the access token, refreshing once");
        self.auth.invalidate().await;
        let token = self.auth.access_token().await?;
        self.http_client.send(build(&token)).await
    }

    fn events_url(&self, calendar_id: &str) -> Result<Url> {
        endpoint(&self.calendar_api_base, &["calendars", calendar_id, "events"])
    }

    fn tasks_url(&self, list_id: &str) -> Result<Url> {
        endpoint(&self.tasks_api_base, &["lists", list_id, "tasks"])
    }

    /// Settle an insert that collided with an existing id
    ///
    /// A live event with the id is the earlier attempt of this insert. A
    /// deleted one still owns the id, so it is restored with the proposed
    /// content instead.
    async fn resolve_conflict(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &ProposedEvent,
    ) -> Result<String> {
        let url =
            endpoint(&self.calendar_api_base, &["calendars", calendar_id, "events", event_id])?;
        let response = self
            .send_authorized(|token| {
                self.http_client.request(Method::GET, url.clone()).bearer_auth(token)
            })
            .await?;
        let existing: GoogleEvent = decode(ensure_success(response).await?).await?;

        if !existing.is_cancelled() {
            info!(calendar_id, event_id, "Event already exists, treating insert as done");
            return Ok(existing.id.unwrap_or_else(|| event_id.to_string()));
        }

        info!(calendar_id, event_id, "Event id belongs to a deleted event, restoring it");
        let mut body = serde_json::to_value(event)
            .map_err(|e| PlanError::internal(format!("failed to encode event: {e}")))?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("status".to_string(), "confirmed".into());
        }
        let response = self
            .send_authorized(|token| {
                self.http_client.request(Method::PUT, url.clone()).bearer_auth(token).json(&body)
            })
            .await?;
        let restored: InsertedEvent = decode(ensure_success(response).await?).await?;
        Ok(restored.id)
    }

    /// Calendars visible to the account, for locating calendar ids
    ///
    /// # Errors
    /// Transport, authentication and API errors as for any other call.
    pub async fn list_calendars(&self) -> Result<Vec<CalendarSummary>> {
        let url = endpoint(&self.calendar_api_base, &["users", "me", "calendarList"])?;
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let response = self
                .send_authorized(|token| {
                    let mut request =
                        self.http_client.request(Method::GET, url.clone()).bearer_auth(token);
                    if let Some(page) = page_token.as_deref() {
                        request = request.query(&[("pageToken", page)]);
                    }
                    request
                })
                .await?;
            let page: CalendarListPage = decode(ensure_success(response).await?).await?;

            calendars.extend(page.items.into_iter().map(CalendarSummary::from));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(count = calendars.len(), "Listed calendars");
        Ok(calendars)
    }
}

#[async_trait]
impl CalendarWorkspace for GoogleWorkspaceClient {
    async fn ensure_authenticated(&self) -> Result<()> {
        self.auth.access_token().await.map(|_| ())
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let url = self.events_url(calendar_id)?;
        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = time_max.to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = EVENTS_PAGE_SIZE.to_string();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let response = self
                .send_authorized(|token| {
                    let mut query = vec![
                        ("timeMin", time_min.as_str()),
                        ("timeMax", time_max.as_str()),
                        ("singleEvents", "true"),
                        ("orderBy", "startTime"),
                        ("maxResults", page_size.as_str()),
                    ];
                    if let Some(page) = page_token.as_deref() {
                        query.push(("pageToken", page));
                    }
                    self.http_client
                        .request(Method::GET, url.clone())
                        .bearer_auth(token)
                        .query(&query)
                })
                .await?;
            let page: EventsPage = decode(ensure_success(response).await?).await?;

            events.extend(page.items.into_iter().filter_map(|event| event.into_calendar_event()));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(calendar_id, count = events.len(), "Listed calendar events");
        Ok(events)
    }

    async fn insert_event(&self, calendar_id: &str, event: &ProposedEvent) -> Result<String> {
        let url = self.events_url(calendar_id)?;
        let response = self
            .send_authorized(|token| {
                self.http_client.request(Method::POST, url.clone()).bearer_auth(token).json(event)
            })
            .await?;

        if response.status() == StatusCode::CONFLICT {
            if let Some(id) = event.id.as_deref() {
                return self.resolve_conflict(calendar_id, id, event).await;
            }
        }

        let inserted: InsertedEvent = decode(ensure_success(response).await?).await?;
        debug!(calendar_id, event_id = %inserted.id, summary = %event.summary, "Inserted event");
        Ok(inserted.id)
    }

    async fn list_task_lists(&self) -> Result<Vec<TaskList>> {
        let url = endpoint(&self.tasks_api_base, &["users", "@me", "lists"])?;
        let response = self
            .send_authorized(|token| {
                self.http_client
                    .request(Method::GET, url.clone())
                    .bearer_auth(token)
                    .query(&[("maxResults", "100")])
            })
            .await?;
        let page: TaskListsPage = decode(ensure_success(response).await?).await?;

        Ok(page.items.into_iter().map(|list| TaskList { id: list.id, title: list.title }).collect())
    }

    async fn list_tasks(&self, list_id: &str, limit: u32) -> Result<Vec<Task>> {
        let url = self.tasks_url(list_id)?;
        let mut tasks: Vec<Task> = Vec::new();
        let mut page_token: Option<String> = None;

        while u32::try_from(tasks.len()).unwrap_or(u32::MAX) < limit {
            let remaining = limit - u32::try_from(tasks.len()).unwrap_or(limit);
            let page_size = remaining.min(TASKS_PAGE_SIZE).to_string();
            let response = self
                .send_authorized(|token| {
                    let mut query =
                        vec![("maxResults", page_size.as_str()), ("showCompleted", "true")];
                    if let Some(page) = page_token.as_deref() {
                        query.push(("pageToken", page));
                    }
                    self.http_client
                        .request(Method::GET, url.clone())
                        .bearer_auth(token)
                        .query(&query)
                })
                .await?;
            let page: TasksPage = decode(ensure_success(response).await?).await?;

            tasks.extend(page.items.into_iter().filter(|task| !task.deleted).map(Task::from));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tasks.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        debug!(list_id, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    async fn insert_task(&self, list_id: &str, task: &NewTask) -> Result<Task> {
        let url = self.tasks_url(list_id)?;
        let response = self
            .send_authorized(|token| {
                self.http_client.request(Method::POST, url.clone()).bearer_auth(token).json(task)
            })
            .await?;
        let created: GoogleTask = decode(ensure_success(response).await?).await?;

        info!(list_id, title = %created.title, "Inserted task");
        Ok(created.into())
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| PlanError::transport(format!("failed to read response body: {e}")))?;
    serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Unexpected Google API payload");
        PlanError::internal(format!("unexpected Google API payload: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{FixedOffset, TimeZone};
    use weekplan_core::{CalendarWriter, RetryPolicy};
    use weekplan_domain::{EventDateTime, EventTime, InsertResult, TaskStatus};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> GoogleWorkspaceClient {
        let http = HttpClient::builder().timeout(Duration::from_secs(5)).build().unwrap();
        let mut config = GoogleConfig::new("primary", "ai-cal");
        config.calendar_api_base = format!("{}/calendar/v3", server.uri());
        config.tasks_api_base = format!("{}/tasks/v1", server.uri());
        let auth = Arc::new(GoogleAuth::with_token("ya29.test", http.clone()));
        GoogleWorkspaceClient::new(http, auth, &config)
    }

    fn created(id: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": id }))
    }

    fn proposed(id: Option<&str>) -> ProposedEvent {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        ProposedEvent {
            id: id.map(str::to_string),
            summary: "Study maths".into(),
            description: None,
            location: None,
            start: EventDateTime {
                date_time: offset.with_ymd_and_hms(2025, 7, 16, 16, 0, 0).unwrap(),
                time_zone: "Europe/Prague".into(),
            },
            end: EventDateTime {
                date_time: offset.with_ymd_and_hms(2025, 7, 16, 17, 0, 0).unwrap(),
                time_zone: "Europe/Prague".into(),
            },
            color_id: Some("5".into()),
        }
    }

    #[tokio::test]
    async fn list_events_follows_pages_and_skips_cancelled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"summary": "Holiday", "start": {"date": "2025-07-18"}, "end": {"date": "2025-07-19"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(query_param("timeMin", "2025-07-14T08:00:00Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"summary": "Dentist", "start": {"dateTime": "2025-07-15T15:00:00+02:00"}, "end": {"dateTime": "2025-07-15T16:00:00+02:00"}},
                    {"status": "cancelled", "summary": "Gone", "start": {"dateTime": "2025-07-16T15:00:00+02:00"}}
                ],
                "nextPageToken": "p2"
            })))
            .mount(&server)
            .await;

        let events = client(&server)
            .list_events(
                "primary",
                Utc.with_ymd_and_hms(2025, 7, 14, 8, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 7, 21, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].summary, "Dentist");
        assert!(matches!(events[1].start, EventTime::Date(_)));
    }

    #[tokio::test]
    async fn insert_event_posts_client_id_and_returns_server_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/ai-cal/events"))
            .and(body_partial_json(serde_json::json!({
                "id": "abc123",
                "summary": "Study maths",
                "colorId": "5",
                "start": {"timeZone": "Europe/Prague"}
            })))
            .respond_with(created("abc123"))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).insert_event("ai-cal", &proposed(Some("abc123"))).await.unwrap();
        assert_eq!(id, "abc123");
    }

    #[tokio::test]
    async fn conflict_with_live_event_counts_as_inserted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_string("The requested identifier already exists."),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/ai-cal/events/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc123", "status": "confirmed", "summary": "Study maths"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ws = client(&server);
        assert_eq!(ws.insert_event("ai-cal", &proposed(Some("abc123"))).await.unwrap(), "abc123");

        let err = ws.insert_event("ai-cal", &proposed(None)).await.unwrap_err();
        assert!(matches!(err, PlanError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn conflict_with_deleted_event_restores_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/ai-cal/events/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc123", "status": "cancelled"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/calendar/v3/calendars/ai-cal/events/abc123"))
            .and(body_partial_json(serde_json::json!({
                "id": "abc123",
                "status": "confirmed",
                "summary": "Study maths"
            })))
            .respond_with(created("abc123"))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).insert_event("ai-cal", &proposed(Some("abc123"))).await.unwrap();
        assert_eq!(id, "abc123");
    }

    #[tokio::test]
    async fn quota_errors_are_retried_by_the_writer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "errors": [{"reason": "rateLimitExceeded"}]}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST")).respond_with(created("abc123")).mount(&server).await;

        let workspace: Arc<dyn CalendarWorkspace> = Arc::new(client(&server));
        let retry = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let writer = CalendarWriter::new(workspace, "ai-cal", 2, retry);

        let report = writer.commit(vec![proposed(None)]).await.unwrap();

        assert_eq!(report.outcomes[0].attempts, 2);
        assert!(matches!(report.outcomes[0].result, InsertResult::Inserted { .. }));
    }

    #[tokio::test]
    async fn list_calendars_reads_the_calendar_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/users/me/calendarList"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "me@example.com", "summary": "Me", "primary": true, "accessRole": "owner"},
                    {"id": "ai@group.calendar.google.com", "summary": "AI plan", "accessRole": "writer"}
                ]
            })))
            .mount(&server)
            .await;

        let calendars = client(&server).list_calendars().await.unwrap();

        assert_eq!(calendars.len(), 2);
        assert!(calendars[0].primary);
        assert_eq!(calendars[1].id, "ai@group.calendar.google.com");
        assert_eq!(calendars[1].summary, "AI plan");
        assert_eq!(calendars[1].access_role.as_deref(), Some("writer"));
    }

    #[tokio::test]
    async fn server_errors_stay_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend error"))
            .mount(&server)
            .await;

        let err =
            client(&server).insert_event("ai-cal", &proposed(Some("abc123"))).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn list_tasks_respects_limit_and_skips_deleted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/v1/lists/list-1/tasks"))
            .and(query_param("maxResults", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"title": "Essay", "due": "2025-07-18T00:00:00.000Z", "status": "needsAction"},
                    {"title": "Old", "deleted": true, "status": "completed"},
                    {"title": "Lab report", "status": "completed", "completed": "2025-07-10T09:00:00.000Z"}
                ]
            })))
            .mount(&server)
            .await;

        let tasks = client(&server).list_tasks("list-1", 2).await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Essay");
        assert_eq!(tasks[1].status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn missing_task_list_surfaces_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = client(&server).list_tasks("nope", 10).await.unwrap_err();
        assert!(matches!(err, PlanError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn task_lists_and_task_insert_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/v1/users/@me/lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "list-1", "title": "School"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tasks/v1/lists/list-1/tasks"))
            .and(body_partial_json(serde_json::json!({"title": "Revise chemistry"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t-1", "title": "Revise chemistry", "status": "needsAction"
            })))
            .mount(&server)
            .await;

        let ws = client(&server);
        let lists = ws.list_task_lists().await.unwrap();
        assert_eq!(lists, vec![TaskList { id: "list-1".into(), title: "School".into() }]);

        let task = ws.insert_task("list-1", &NewTask::new("Revise chemistry")).await.unwrap();
        assert_eq!(task.title, "Revise chemistry");
        assert_eq!(task.status, TaskStatus::NeedsAction);
    }

    #[tokio::test]
    async fn rejected_token_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Credentials"))
            .mount(&server)
            .await;

        let err = client(&server).list_task_lists().await.unwrap_err();
        assert!(matches!(err, PlanError::Auth { .. }));
    }
}
