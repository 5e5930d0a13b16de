//! Input record types
//!
//! One struct per source family. Every field is nullable, matching how the
//! producers emit them, but a present value of the wrong JSON type is a
//! hard deserialisation error rather than a silent null.

use serde::{Deserialize, Deserializer};

/// Track metadata record (one per song data object)
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub artist_id: Option<String>,

    #[serde(default)]
    pub artist_latitude: Option<f64>,

    #[serde(default)]
    pub artist_location: Option<String>,

    #[serde(default)]
    pub artist_longitude: Option<f64>,

    #[serde(default)]
    pub artist_name: Option<String>,

    /// Track length in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub num_songs: Option<i32>,

    #[serde(default)]
    pub title: Option<String>,

    /// Release year; producers use 0 for "unknown"
    #[serde(default)]
    pub year: Option<i32>,
}

/// User activity event (one per log line)
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Artist name text as seen by the player
    #[serde(default)]
    pub artist: Option<String>,

    #[serde(default)]
    pub auth: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default)]
    pub item_in_session: Option<i64>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub length: Option<f64>,

    /// Subscription level ("free" / "paid")
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    /// Page type; only the play marker counts downstream
    #[serde(default)]
    pub page: Option<String>,

    #[serde(default)]
    pub registration: Option<f64>,

    #[serde(default, deserialize_with = "string_or_integer")]
    pub session_id: Option<String>,

    /// Song title text as seen by the player
    #[serde(default)]
    pub song: Option<String>,

    #[serde(default)]
    pub status: Option<i64>,

    /// Event time, epoch milliseconds
    #[serde(default)]
    pub ts: Option<i64>,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default, deserialize_with = "string_or_integer")]
    pub user_id: Option<String>,
}

impl ActivityRecord {
    /// Whether this event is a play under the given page marker
    pub fn is_play(&self, marker: &str) -> bool {
        self.page.as_deref() == Some(marker)
    }
}

/// Identifiers arrive as strings in some producers and integers in others
#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Integer(i64),
}

fn string_or_integer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<IdValue>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        IdValue::Text(s) => s,
        IdValue::Integer(n) => n.to_string(),
    }))
}
