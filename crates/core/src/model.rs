use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::stamp;

pub const COLLECTION_KEYS: [&str; 6] = [
    "sets",
    "articles",
    "trending",
    "plans",
    "aiMessages",
    "notifications",
];

/// The full in-memory copy of the six structured collections. Records are
/// opaque beyond what each write path puts into them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub sets: Vec<Value>,
    #[serde(default)]
    pub articles: Vec<Value>,
    #[serde(default)]
    pub trending: Vec<Value>,
    #[serde(default)]
    pub plans: Vec<Value>,
    #[serde(default, rename = "aiMessages")]
    pub ai_messages: Vec<Value>,
    #[serde(default)]
    pub notifications: Vec<Value>,
}

impl Snapshot {
    /// Builds a snapshot from raw JSON, filling any missing collection with
    /// an empty sequence. Unknown top-level keys are discarded, with a log
    /// line naming each one.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        if let Value::Object(map) = &value {
            for key in map.keys() {
                if !COLLECTION_KEYS.contains(&key.as_str()) {
                    warn!(key = %key, "dropping unknown top-level key from data file");
                }
            }
        }
        serde_json::from_value(value)
    }

    pub fn collection(&self, which: Collection) -> &[Value] {
        match which {
            Collection::Sets => &self.sets,
            Collection::Articles => &self.articles,
            Collection::Trending => &self.trending,
            Collection::Plans => &self.plans,
            Collection::AiMessages => &self.ai_messages,
            Collection::Notifications => &self.notifications,
        }
    }

    pub fn collection_mut(&mut self, which: Collection) -> &mut Vec<Value> {
        match which {
            Collection::Sets => &mut self.sets,
            Collection::Articles => &mut self.articles,
            Collection::Trending => &mut self.trending,
            Collection::Plans => &mut self.plans,
            Collection::AiMessages => &mut self.ai_messages,
            Collection::Notifications => &mut self.notifications,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Sets,
    Articles,
    Trending,
    Plans,
    AiMessages,
    Notifications,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Sets => "sets",
            Collection::Articles => "articles",
            Collection::Trending => "trending",
            Collection::Plans => "plans",
            Collection::AiMessages => "aiMessages",
            Collection::Notifications => "notifications",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
}

impl UserRecord {
    pub fn from_input(input: NewUser) -> Result<Self> {
        if input.phone.is_empty() {
            return Err(StoreError::Validation("phone is required".to_string()));
        }
        Ok(Self {
            id: stamp::next_id(),
            phone: input.phone,
            name: input.name,
            email: input.email,
            company: input.company,
            notes: input.notes,
            created_at: created_at_stamp(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl NotificationRecord {
    pub fn from_input(input: NewNotification) -> Result<Self> {
        if input.title.is_empty() || input.message.is_empty() {
            return Err(StoreError::Validation(
                "title and message are required".to_string(),
            ));
        }
        Ok(Self {
            id: stamp::next_id(),
            title: input.title,
            message: input.message,
            created_at: created_at_stamp(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNotification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub category: String,
    pub date: String,
    pub author: String,
}

impl ArticleRecord {
    pub fn from_input(input: NewArticle) -> Result<Self> {
        if input.title.is_empty() {
            return Err(StoreError::Validation("title is required".to_string()));
        }
        let category = if input.category.is_empty() {
            derive_category(&input.kind).to_string()
        } else {
            input.category
        };
        Ok(Self {
            title: input.title,
            category,
            date: input.date,
            author: input.author,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub author: String,
}

fn default_kind() -> String {
    "article".to_string()
}

pub fn derive_category(kind: &str) -> &'static str {
    match kind {
        "caseLaw" => "Case Law",
        "circular" => "Circulars",
        _ => "Updates",
    }
}

fn created_at_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
