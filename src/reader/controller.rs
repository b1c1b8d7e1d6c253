use std::sync::Arc;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{
    db::{
        models::NotificationCategory, Database, NotificationFilter, NotificationPage,
        NotificationRecord, PageCursor,
    },
    error::{Error, Result},
    listener::{self, NotificationSource, RawNotification},
    settings::{ConfigStore, ReaderConfig},
};

use super::import::{parse_batch, validate_records};

/// Captured records buffered per subscriber before the slowest one lags.
const POSTED_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Ongoing,
    Transport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Written to the store and broadcast.
    Stored(NotificationRecord),
    /// Broadcast only; the store is at its configured size limit.
    NotPersisted(NotificationRecord),
    /// Dropped by a capture filter; neither stored nor broadcast.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSize {
    pub size_bytes: u64,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
}

impl DatabaseSize {
    fn from_bytes(size_bytes: u64) -> Self {
        Self {
            size_bytes,
            size_mb: size_bytes as f64 / (1024.0 * 1024.0),
        }
    }
}

/// Entry point for every plugin operation.
///
/// Owns the store handle, the capture settings, the injected platform source
/// and the broadcast channel that fans captured records out to subscribers.
#[derive(Clone)]
pub struct NotificationReader {
    db: Database,
    config: Arc<ConfigStore>,
    source: Arc<dyn NotificationSource>,
    posted_tx: broadcast::Sender<NotificationRecord>,
}

impl NotificationReader {
    pub fn new(db: Database, config: ConfigStore, source: Arc<dyn NotificationSource>) -> Self {
        let (posted_tx, _) = broadcast::channel(POSTED_CHANNEL_CAPACITY);
        Self {
            db,
            config: Arc::new(config),
            source,
            posted_tx,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Live feed of captured notifications. Subscribers that fall more than
    /// the channel capacity behind lose the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRecord> {
        self.posted_tx.subscribe()
    }

    /// Handles one notification observed by the platform listener.
    ///
    /// The record is broadcast even when the store write fails; the storage
    /// error is still returned to the caller.
    pub async fn capture(&self, raw: RawNotification) -> Result<CaptureOutcome> {
        let record = listener::parse(raw);
        let config = self.config.get();

        if config.filter_ongoing && record.is_ongoing {
            return Ok(CaptureOutcome::Skipped(SkipReason::Ongoing));
        }
        if config.filter_transport && record.category == NotificationCategory::Transport {
            return Ok(CaptureOutcome::Skipped(SkipReason::Transport));
        }

        let stored = match self.within_storage_limit(config.storage_limit_bytes()).await {
            Ok(true) => Some(self.db.upsert_notification(&record).await),
            Ok(false) => {
                warn!(
                    "Storage limit reached; notification {} from {} not persisted",
                    record.id, record.source_app
                );
                None
            }
            Err(err) => Some(Err(err)),
        };

        self.broadcast(&record);

        match stored {
            Some(Ok(())) => Ok(CaptureOutcome::Stored(record)),
            Some(Err(err)) => {
                error!("Failed to store notification {}: {err}", record.id);
                Err(err)
            }
            None => Ok(CaptureOutcome::NotPersisted(record)),
        }
    }

    async fn within_storage_limit(&self, limit: Option<u64>) -> Result<bool> {
        match limit {
            Some(limit) => Ok(self.db.size_on_disk().await? < limit),
            None => Ok(true),
        }
    }

    fn broadcast(&self, record: &NotificationRecord) {
        // An error only means nobody is subscribed right now.
        if self.posted_tx.send(record.clone()).is_err() {
            log::debug!("No subscribers for notification {}", record.id);
        }
    }

    /// Notifications currently on screen, straight from the source.
    pub async fn get_active_notifications(&self) -> Result<Vec<NotificationRecord>> {
        let raw = self.source.active_notifications().await?;
        Ok(raw.into_iter().map(listener::parse).collect())
    }

    pub async fn is_access_enabled(&self) -> Result<bool> {
        self.source.is_access_enabled().await
    }

    pub async fn open_access_settings(&self) -> Result<bool> {
        self.source.open_access_settings().await
    }

    pub async fn get_notifications(
        &self,
        filter: &NotificationFilter,
        cursor: Option<&PageCursor>,
        limit: Option<i64>,
    ) -> Result<NotificationPage> {
        self.db.query_notifications(filter, cursor, limit).await
    }

    pub async fn delete_all_notifications(&self) -> Result<()> {
        let removed = self.db.delete_all_notifications().await?;
        info!("Deleted {removed} stored notifications");
        Ok(())
    }

    pub async fn get_total_count(&self) -> Result<u64> {
        self.db.count_notifications().await
    }

    pub async fn get_database_size(&self) -> Result<DatabaseSize> {
        self.db.size_on_disk().await.map(DatabaseSize::from_bytes)
    }

    /// Imports a JSON batch with replace-by-id semantics. Nothing is written
    /// unless every entry validates. Imported records are not broadcast.
    pub async fn import_notifications(&self, values: Vec<Value>) -> Result<usize> {
        let records = parse_batch(values)?;
        self.import_records(records).await
    }

    pub async fn import_records(&self, records: Vec<NotificationRecord>) -> Result<usize> {
        validate_records(&records)?;
        let imported = self.db.upsert_notifications(records).await?;
        info!("Imported {imported} notifications");
        Ok(imported)
    }

    pub fn get_config(&self) -> ReaderConfig {
        self.config.get()
    }

    pub fn set_config(&self, config: ReaderConfig) -> Result<()> {
        self.config
            .update(config)
            .map_err(|err| Error::Config(format!("{err:#}")))
    }
}
