mod config;
mod error;
mod extract;
mod model;
mod stamp;
mod store;
mod uploads;
mod watch;

pub use config::ServiceConfig;
pub use error::{Result, StoreError};
pub use extract::{
    summarize, ExtractionBridge, ExtractionEngine, ExtractionSummary, SubprocessExtractor,
};
pub use model::{
    derive_category, ArticleRecord, Collection, NewArticle, NewNotification, NewUser,
    NotificationRecord, Snapshot, UserRecord, COLLECTION_KEYS,
};
pub use stamp::{next_id, next_millis};
pub use store::{DocumentStore, UserRegistry};
pub use uploads::{SavedUpload, UploadStore};
pub use watch::spawn_watcher;
