//! WebEx API client
//!
//! OAuth2 token exchange plus the small slice of the meetings REST surface
//! the backend drives: create, reschedule, delete.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::WebexConfig;

const WEBEX_BASE_URL: &str = "https://webexapis.com/v1";
const OAUTH_SCOPES: &str = "meeting:schedules_read meeting:schedules_write spark:kms";

/// WebEx client errors
#[derive(Debug, Error)]
pub enum WebexError {
    #[error("WebEx credentials not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    #[error("Token rejected")]
    TokenRejected,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// OAuth token grant response
#[derive(Debug, Clone, Deserialize)]
pub struct WebexTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: Option<i64>,
}

/// Meeting as returned by the WebEx meetings API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebexMeeting {
    pub id: String,
    pub title: Option<String>,
    #[serde(rename = "webLink")]
    pub web_link: Option<String>,
    pub password: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// WebEx API client
pub struct WebexClient {
    http_client: reqwest::Client,
    credentials: Option<WebexConfig>,
    base_url: String,
}

impl WebexClient {
    pub fn new(credentials: Option<WebexConfig>) -> Result<Self, WebexError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WebexError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            base_url: WEBEX_BASE_URL.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<&WebexConfig, WebexError> {
        self.credentials.as_ref().ok_or(WebexError::NotConfigured)
    }

    /// Build the OAuth authorization URL the frontend redirects users to
    pub fn authorization_url(&self) -> Result<String, WebexError> {
        let creds = self.credentials()?;
        let mut url = reqwest::Url::parse(&format!("{}/authorize", self.base_url))
            .map_err(|e| WebexError::ParseError(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &creds.client_id)
            .append_pair("redirect_uri", &creds.redirect_uri)
            .append_pair("scope", OAUTH_SCOPES);
        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<WebexTokens, WebexError> {
        let creds = self.credentials()?;
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", creds.redirect_uri.as_str()),
        ];
        self.token_request(&params).await
    }

    /// Refresh an expired access token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<WebexTokens, WebexError> {
        let creds = self.credentials()?;
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<WebexTokens, WebexError> {
        let url = format!("{}/access_token", self.base_url);

        tracing::debug!(url = %url, "Requesting WebEx token grant");

        let response = self
            .http_client
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(|e| WebexError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 400 || status.as_u16() == 401 {
            return Err(WebexError::TokenRejected);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WebexError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| WebexError::ParseError(e.to_string()))
    }

    /// Create a meeting on behalf of the organizer
    pub async fn create_meeting(
        &self,
        access_token: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WebexMeeting, WebexError> {
        let url = format!("{}/meetings", self.base_url);
        let body = serde_json::json!({
            "title": title,
            "start": format_webex_time(start),
            "end": format_webex_time(end),
        });

        tracing::debug!(title = %title, "Creating WebEx meeting");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WebexError::NetworkError(e.to_string()))?;

        let meeting: WebexMeeting = Self::parse_meeting_response(response).await?;

        tracing::info!(webex_id = %meeting.id, "Created WebEx meeting");

        Ok(meeting)
    }

    /// Reschedule an existing meeting
    pub async fn update_meeting(
        &self,
        access_token: &str,
        webex_id: &str,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WebexMeeting, WebexError> {
        let url = format!("{}/meetings/{}", self.base_url, webex_id);
        let body = serde_json::json!({
            "title": title,
            "start": format_webex_time(start),
            "end": format_webex_time(end),
        });

        let response = self
            .http_client
            .put(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| WebexError::NetworkError(e.to_string()))?;

        Self::parse_meeting_response(response).await
    }

    /// Delete a meeting
    pub async fn delete_meeting(&self, access_token: &str, webex_id: &str) -> Result<(), WebexError> {
        let url = format!("{}/meetings/{}", self.base_url, webex_id);

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| WebexError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 404 {
            return Err(WebexError::MeetingNotFound(webex_id.to_string()));
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(WebexError::TokenRejected);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WebexError::ApiError(status.as_u16(), error_text));
        }

        Ok(())
    }

    async fn parse_meeting_response(response: reqwest::Response) -> Result<WebexMeeting, WebexError> {
        let status = response.status();

        if status.as_u16() == 404 {
            return Err(WebexError::MeetingNotFound("unknown".to_string()));
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(WebexError::TokenRejected);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WebexError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| WebexError::ParseError(e.to_string()))
    }
}

/// WebEx expects second-resolution ISO 8601 with a Z suffix
fn format_webex_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_config() -> WebexConfig {
        WebexConfig {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://app.example.com/callback".to_string(),
        }
    }

    #[test]
    fn unconfigured_client_refuses_auth_url() {
        let client = WebexClient::new(None).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.authorization_url(),
            Err(WebexError::NotConfigured)
        ));
    }

    #[test]
    fn authorization_url_carries_credentials() {
        let client = WebexClient::new(Some(test_config())).unwrap();
        let url = client.authorization_url().unwrap();
        assert!(url.starts_with("https://webexapis.com/v1/authorize?"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback"));
    }

    #[test]
    fn webex_time_format() {
        let t = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(format_webex_time(t), "2026-03-14T09:26:53Z");
    }

    #[test]
    fn meeting_response_parses_weblink() {
        let raw = r#"{"id": "mtg1", "title": "Sync", "webLink": "https://meet.webex.com/x", "password": "p", "start": "2026-03-14T09:00:00Z", "end": "2026-03-14T10:00:00Z"}"#;
        let meeting: WebexMeeting = serde_json::from_str(raw).unwrap();
        assert_eq!(meeting.id, "mtg1");
        assert_eq!(meeting.web_link.as_deref(), Some("https://meet.webex.com/x"));
    }
}
