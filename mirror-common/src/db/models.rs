//! Database row models
//!
//! Guids are UUIDv4 strings; timestamps are RFC3339 strings bound explicitly
//! at insert time (the schema's CURRENT_TIMESTAMP defaults are a fallback).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub guid: String,
    pub email: String,
    pub password_hash: String,
    pub organization: Option<String>,
    pub webex_access_token: Option<String>,
    pub webex_refresh_token: Option<String>,
    pub webex_token_expires_at: Option<String>,
    pub created_at: String,
}

impl Account {
    /// Whether a WebEx OAuth connection is stored for this account
    pub fn webex_connected(&self) -> bool {
        self.webex_access_token.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub guid: String,
    pub account_guid: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub class_size: Option<i64>,
    /// JSON array of interest strings
    pub interests: Option<serde_json::Value>,
    /// JSON object mapping day to hours
    pub availability: Option<serde_json::Value>,
    /// Free-form JSON extension bag
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "accepted" => Some(RequestStatus::Accepted),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FriendRequest {
    pub guid: String,
    pub sender_profile_guid: String,
    pub receiver_profile_guid: String,
    pub status: RequestStatus,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub guid: String,
    pub from_profile_guid: String,
    pub to_profile_guid: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub guid: String,
    pub account_guid: String,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub read: bool,
    pub related_guid: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub guid: String,
    pub profile_guid: String,
    pub content: String,
    pub image_url: Option<String>,
    pub quoted_post_guid: Option<String>,
    pub likes: i64,
    pub comments_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Meeting {
    pub guid: String,
    pub webex_id: Option<String>,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub web_link: Option<String>,
    pub password: Option<String>,
    pub creator_profile_guid: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvitationStatus::Pending),
            "accepted" => Some(InvitationStatus::Accepted),
            "declined" => Some(InvitationStatus::Declined),
            "cancelled" => Some(InvitationStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeetingInvitation {
    pub guid: String,
    pub sender_profile_guid: String,
    pub receiver_profile_guid: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub status: InvitationStatus,
    pub meeting_guid: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RecentCall {
    pub guid: String,
    pub caller_profile_guid: String,
    pub target_profile_guid: Option<String>,
    pub target_name: Option<String>,
    pub duration_seconds: i64,
    pub call_type: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invitation_status_roundtrip() {
        for s in ["pending", "accepted", "declined", "cancelled"] {
            assert_eq!(InvitationStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(InvitationStatus::parse("bogus").is_none());
    }

    #[test]
    fn request_status_roundtrip() {
        for s in ["pending", "accepted", "rejected"] {
            assert_eq!(RequestStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(RequestStatus::parse("bogus").is_none());
    }
}
