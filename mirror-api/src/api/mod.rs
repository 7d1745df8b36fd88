//! HTTP API handlers for mirror-api

pub mod account;
pub mod auth;
pub mod auth_middleware;
pub mod calls;
pub mod documents;
pub mod friends;
pub mod health;
pub mod meetings;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod webex;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a client-supplied timestamp
///
/// Accepts RFC3339 (with offset or trailing Z) and bare ISO 8601 without an
/// offset, which is treated as UTC.
pub fn parse_client_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_z() {
        let t = parse_client_time("2026-05-01T09:00:00Z").unwrap();
        assert_eq!(t.to_rfc3339(), "2026-05-01T09:00:00+00:00");
    }

    #[test]
    fn parses_naive_as_utc() {
        let t = parse_client_time("2026-05-01T09:00:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2026-05-01T09:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_client_time("next tuesday").is_none());
    }
}
