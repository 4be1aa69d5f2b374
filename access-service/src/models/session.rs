use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presence record used for "active in the last N minutes" queries.
/// Not a credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_active: DateTime<Utc>,
}
