//! Database query modules, one per entity

pub mod accounts;
pub mod friends;
pub mod invitations;
pub mod meetings;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod recent_calls;

use chrono::{DateTime, SecondsFormat, Utc};

/// Canonical storage format for timestamps: second-resolution RFC3339 with a
/// Z suffix. All stored timestamps share this format so string comparison
/// orders them correctly.
pub fn format_rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// RFC3339 timestamp for explicit created_at/updated_at binds
pub fn now_rfc3339() -> String {
    format_rfc3339(Utc::now())
}

/// Fresh guid for a new row
pub fn new_guid() -> String {
    uuid::Uuid::new_v4().to_string()
}
