//! HTTP client for the event backend and the auth service.
//!
//! All privileged calls carry the session's bearer token. The backend wraps
//! many responses in a `{"status", "error", ...}` envelope and has shipped
//! list payloads both bare and wrapped, so parsing is tolerant of both.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{multipart, Client, Method, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::models::{Event, EventDraft, EventFilter, EventSummary, Profile, UserInfo};

use super::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    #[serde(default)]
    pub email: String,
}

/// Auth service response for POST /login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub expires: Option<String>,
    pub user: AuthUser,
}

/// Backend response for POST /register.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub token: String,
}

/// New-account payload, serialized into the `user` multipart field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// The backend's response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(rename = "eventId", default)]
    event_id: Option<i64>,
}

impl Envelope {
    fn into_result(self) -> Result<Self, ApiError> {
        if self.status.eq_ignore_ascii_case("error") {
            Err(ApiError::Backend(
                self.error.unwrap_or_else(|| "request failed".to_string()),
            ))
        } else {
            Ok(self)
        }
    }
}

/// Client for both services.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    backend_url: String,
    auth_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(backend_url: &str, auth_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for privileged requests.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn envelope_of(response: reqwest::Response) -> Result<Envelope> {
        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read response body")?;
        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|_| ApiError::InvalidResponse(text.chars().take(200).collect::<String>()))?;
        Ok(envelope.into_result()?)
    }

    // ===== Auth service =====

    /// Authenticate and obtain a bearer token plus the user id.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let url = format!("{}/login", self.auth_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let response = Self::check_response(response).await?;
        let login: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;
        debug!(user_id = login.user.id, expires = ?login.expires, "authenticated");
        Ok(login)
    }

    /// Create an account. The backend takes a multipart body: a `user` JSON
    /// field plus an optional `image` avatar file.
    pub async fn register(
        &self,
        request: &RegisterRequest,
        avatar: Option<&Path>,
    ) -> Result<RegisterResponse> {
        let url = format!("{}/register", self.backend_url);

        let user_json =
            serde_json::to_string(request).context("Failed to serialize registration payload")?;
        let mut form = multipart::Form::new().text("user", user_json);

        if let Some(path) = avatar {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read avatar file {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "avatar".to_string());
            form = form.part("image", multipart::Part::bytes(bytes).file_name(file_name));
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send registration request")?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read registration response")?;
        parse_registration(&text)
    }

    // ===== Events =====

    /// Fetch the event listing, filtered server-side.
    pub async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<EventSummary>> {
        let url = format!("{}/api/events", self.backend_url);

        let response = self
            .request(Method::GET, &url)
            .query(&filter.query_pairs())
            .send()
            .await
            .context("Failed to fetch events")?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read events response")?;
        let events = parse_events(&text)?;
        debug!(count = events.len(), "events fetched");
        Ok(events)
    }

    /// Fetch one event's full detail.
    pub async fn fetch_event(&self, event_id: i64) -> Result<Event> {
        let url = format!("{}/event/{}", self.backend_url, event_id);

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch event {event_id}"))?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.context("Failed to read event response")?;
        let mut event = parse_event(&text)?;
        if event.event_id == 0 {
            // Detail responses have shipped without the id; take it from the URL.
            event.event_id = event_id;
        }
        Ok(event)
    }

    /// Create an event, returning its new id.
    pub async fn create_event(&self, draft: &EventDraft) -> Result<i64> {
        let url = format!("{}/event", self.backend_url);

        let response = self
            .request(Method::POST, &url)
            .json(&serde_json::json!({ "event": draft }))
            .send()
            .await
            .context("Failed to send create-event request")?;

        let envelope = Self::envelope_of(response).await?;
        envelope
            .event_id
            .ok_or_else(|| ApiError::InvalidResponse("create response carried no eventId".to_string()).into())
    }

    /// Update an existing event.
    pub async fn update_event(&self, event_id: i64, draft: &EventDraft) -> Result<()> {
        let url = format!("{}/event/{}", self.backend_url, event_id);

        let response = self
            .request(Method::PUT, &url)
            .json(&serde_json::json!({ "event": draft }))
            .send()
            .await
            .with_context(|| format!("Failed to send update for event {event_id}"))?;

        Self::envelope_of(response).await.map(|_| ())
    }

    /// Delete an event.
    pub async fn delete_event(&self, event_id: i64) -> Result<()> {
        let url = format!("{}/event/{}", self.backend_url, event_id);

        let response = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .with_context(|| format!("Failed to send delete for event {event_id}"))?;

        Self::envelope_of(response).await.map(|_| ())
    }

    /// Register the signed-in user for an event.
    pub async fn join_event(&self, event_id: i64, user_id: i64) -> Result<()> {
        let url = format!("{}/participate", self.backend_url);

        let response = self
            .request(Method::POST, &url)
            .json(&serde_json::json!({ "eventId": event_id, "userId": user_id }))
            .send()
            .await
            .context("Failed to send participation request")?;

        Self::envelope_of(response).await.map(|_| ())
    }

    /// Fetch the users registered for an event.
    pub async fn fetch_participants(&self, event_id: i64) -> Result<Vec<UserInfo>> {
        let url = format!("{}/event/{}/participants", self.backend_url, event_id);

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch participants for event {event_id}"))?;

        let response = Self::check_response(response).await?;
        let text = response
            .text()
            .await
            .context("Failed to read participants response")?;
        parse_participants(&text)
    }

    // ===== Profile =====

    /// Fetch a user's profile: their info plus the events they joined.
    pub async fn fetch_profile(&self, user_id: i64) -> Result<Profile> {
        let url = format!("{}/api/profile/{}", self.backend_url, user_id);

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch profile {user_id}"))?;

        let response = Self::check_response(response).await?;
        response.json().await.context("Failed to parse profile response")
    }
}

// Parsing is split out so the wire tolerance is testable without a server.

fn parse_events(text: &str) -> Result<Vec<EventSummary>> {
    if let Ok(events) = serde_json::from_str::<Vec<EventSummary>>(text) {
        return Ok(events);
    }

    #[derive(Deserialize)]
    struct EventsWrapper {
        #[serde(default)]
        events: Vec<EventSummary>,
    }

    let wrapper: EventsWrapper = serde_json::from_str(text)
        .map_err(|_| ApiError::InvalidResponse("unrecognized events payload".to_string()))?;
    Ok(wrapper.events)
}

fn parse_event(text: &str) -> Result<Event> {
    #[derive(Deserialize)]
    struct EventWrapper {
        event: Event,
    }

    if let Ok(wrapper) = serde_json::from_str::<EventWrapper>(text) {
        return Ok(wrapper.event);
    }

    serde_json::from_str::<Event>(text)
        .map_err(|_| ApiError::InvalidResponse("unrecognized event payload".to_string()).into())
}

fn parse_participants(text: &str) -> Result<Vec<UserInfo>> {
    if let Ok(users) = serde_json::from_str::<Vec<UserInfo>>(text) {
        return Ok(users);
    }

    #[derive(Deserialize)]
    struct ParticipantsWrapper {
        #[serde(default, alias = "participants")]
        users: Vec<UserInfo>,
    }

    let wrapper: ParticipantsWrapper = serde_json::from_str(text)
        .map_err(|_| ApiError::InvalidResponse("unrecognized participants payload".to_string()))?;
    Ok(wrapper.users)
}

fn parse_registration(text: &str) -> Result<RegisterResponse> {
    #[derive(Deserialize)]
    struct RegisterWire {
        #[serde(rename = "userId", default)]
        user_id: Option<i64>,
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    let wire: RegisterWire = serde_json::from_str(text)
        .map_err(|_| ApiError::InvalidResponse("unrecognized registration payload".to_string()))?;

    if let Some(error) = wire.error.filter(|e| !e.is_empty()) {
        return Err(ApiError::Backend(error).into());
    }

    match (wire.user_id, wire.token) {
        (Some(user_id), Some(token)) if user_id > 0 && !token.is_empty() => {
            Ok(RegisterResponse { user_id, token })
        }
        _ => Err(ApiError::InvalidResponse(
            "registration response missing userId or token".to_string(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_wrapped_event_lists() {
        let bare = r#"[{"id": 1, "name": "A", "date": "", "address": ""}]"#;
        assert_eq!(parse_events(bare).expect("bare list").len(), 1);

        let wrapped = r#"{"status": "OK", "events": [
            {"id": 1, "name": "A", "date": "", "address": ""},
            {"id": 2, "name": "B", "date": "", "address": ""}
        ]}"#;
        assert_eq!(parse_events(wrapped).expect("wrapped list").len(), 2);

        let empty_envelope = r#"{"status": "OK"}"#;
        assert!(parse_events(empty_envelope).expect("empty envelope").is_empty());

        assert!(parse_events("not json").is_err());
    }

    #[test]
    fn parses_wrapped_event_detail() {
        let wrapped = r#"{"event": {"eventId": 4, "title": "T"}}"#;
        let event = parse_event(wrapped).expect("wrapped detail");
        assert_eq!(event.event_id, 4);

        let bare = r#"{"eventId": 5, "title": "U"}"#;
        assert_eq!(parse_event(bare).expect("bare detail").event_id, 5);
    }

    #[test]
    fn parses_participants_in_either_shape() {
        let bare = r#"[{"email": "a@b.c", "firstName": "A", "lastName": "B"}]"#;
        assert_eq!(parse_participants(bare).expect("bare").len(), 1);

        let wrapped = r#"{"users": [{"email": "a@b.c", "firstName": "A", "lastName": "B"}]}"#;
        assert_eq!(parse_participants(wrapped).expect("wrapped").len(), 1);
    }

    #[test]
    fn registration_success_needs_both_fields() {
        let ok = parse_registration(r#"{"userId": 10, "token": "jwt"}"#).expect("success");
        assert_eq!(ok.user_id, 10);
        assert_eq!(ok.token, "jwt");

        assert!(parse_registration(r#"{"userId": 10}"#).is_err());
        assert!(parse_registration(r#"{"token": "jwt"}"#).is_err());

        let backend_error = parse_registration(r#"{"error": "email taken"}"#);
        let err = backend_error.expect_err("backend error");
        assert!(err.to_string().contains("email taken"));
    }

    #[test]
    fn envelope_error_is_surfaced() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"status": "Error", "error": "validation error"}"#)
                .expect("parse envelope");
        let err = envelope.into_result().expect_err("envelope error");
        assert!(matches!(err, ApiError::Backend(msg) if msg == "validation error"));

        let ok: Envelope = serde_json::from_str(r#"{"status": "OK", "eventId": 3}"#)
            .expect("parse envelope");
        assert_eq!(ok.into_result().expect("ok").event_id, Some(3));
    }

    #[test]
    fn login_response_parses_auth_service_shape() {
        let json = r#"{
            "token": "jwt-token",
            "expires": "2026-02-07T12:00:00Z",
            "user": {"id": 42, "email": "ada@example.com"}
        }"#;
        let login: LoginResponse = serde_json::from_str(json).expect("parse login");
        assert_eq!(login.user.id, 42);
        assert_eq!(login.token, "jwt-token");
        assert!(login.expires.is_some());
    }
}
