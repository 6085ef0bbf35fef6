//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{FieldErrors, Validate};
use crate::utils::errors::Result;

text_enum! {
    pub enum EventType {
        Service => "service",
        BibleStudy => "bible_study",
        Prayer => "prayer",
        Youth => "youth",
        Special => "special",
        Other => "other",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub church_id: i64,
    pub title: String,
    pub event_type: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        self.event_type.parse().unwrap_or(EventType::Other)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub event_type: Option<EventType>,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl Validate for CreateEventRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.required(&self.title, "title");
        errors.max_len(Some(&self.title), 200, "title");
        errors.max_len(self.description.as_deref(), 4000, "description");
        errors.max_len(self.location.as_deref(), 300, "location");
        if let Some(ends_at) = self.ends_at {
            errors.check(ends_at > self.starts_at, "ends_at must be after starts_at");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub event_type: Option<EventType>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateEventRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        if let Some(ref title) = self.title {
            errors.required(title, "title");
        }
        errors.max_len(self.title.as_deref(), 200, "title");
        errors.max_len(self.description.as_deref(), 4000, "description");
        if let (Some(starts_at), Some(ends_at)) = (self.starts_at, self.ends_at) {
            errors.check(ends_at > starts_at, "ends_at must be after starts_at");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub upcoming: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_event_window_validation() {
        let starts_at = Utc::now();
        let request = CreateEventRequest {
            title: "Sunday Service".into(),
            event_type: Some(EventType::Service),
            description: None,
            starts_at,
            ends_at: Some(starts_at - Duration::hours(1)),
            location: None,
        };
        assert!(request.validate().is_err());

        let request = CreateEventRequest { ends_at: Some(starts_at + Duration::hours(2)), ..request };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_event_type_serde() {
        let parsed: EventType = serde_json::from_str("\"bible_study\"").unwrap();
        assert_eq!(parsed, EventType::BibleStudy);
        assert_eq!(EventType::BibleStudy.as_str(), "bible_study");
    }
}
