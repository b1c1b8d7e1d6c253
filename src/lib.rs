//! Tauri plugin that reads OS notifications and keeps a searchable local
//! history of them.
//!
//! Native glue feeds observed notifications into
//! [`NotificationReader::capture`]; the webview queries the history through
//! the plugin commands and receives live `notificationPosted` events.

mod db;
mod error;
mod listener;
mod reader;
mod settings;
mod utils;

use std::{path::PathBuf, sync::Arc};

use log::info;
use tauri::{
    plugin::{Builder as PluginBuilder, TauriPlugin},
    Emitter, Manager, Runtime,
};
use tokio_util::sync::CancellationToken;

pub use db::{
    models::{
        Blob, MessageEntry, NotificationAction, NotificationCategory, NotificationStyle, Progress,
        StyleContent,
    },
    Database, NotificationFilter, NotificationPage, NotificationRecord, PageCursor,
};
pub use error::{Error, Result};
pub use listener::{NotificationSource, RawAction, RawNotification, UnsupportedSource};
pub use reader::{
    CaptureOutcome, DatabaseSize, NotificationReader, SkipReason, NOTIFICATION_POSTED_EVENT,
};
pub use settings::{ConfigStore, ReaderConfig};

const PLUGIN_NAME: &str = "notification-reader";
const DEFAULT_DATABASE_FILE: &str = "notifications.sqlite3";
const CONFIG_FILE: &str = "notification-reader.json";

/// Cancels the webview event forwarder when the plugin is dropped.
struct PostedForwarder(CancellationToken);

/// Access to the plugin's [`NotificationReader`] from any Tauri manager.
pub trait NotificationReaderExt<R: Runtime> {
    fn notification_reader(&self) -> &NotificationReader;
}

impl<R: Runtime, T: Manager<R>> NotificationReaderExt<R> for T {
    fn notification_reader(&self) -> &NotificationReader {
        self.state::<NotificationReader>().inner()
    }
}

/// Plugin with the default source (none) and store location.
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new().build()
}

#[derive(Default)]
pub struct Builder {
    source: Option<Arc<dyn NotificationSource>>,
    database_file: Option<PathBuf>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform listener backing the access and active-notification commands.
    pub fn source(mut self, source: impl NotificationSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Database location; relative paths resolve under the app data directory.
    pub fn database_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_file = Some(path.into());
        self
    }

    pub fn build<R: Runtime>(self) -> TauriPlugin<R> {
        let Builder {
            source,
            database_file,
        } = self;

        PluginBuilder::new(PLUGIN_NAME)
            .invoke_handler(tauri::generate_handler![
                reader::commands::get_active_notifications,
                reader::commands::open_access_settings,
                reader::commands::is_access_enabled,
                reader::commands::get_notifications,
                reader::commands::delete_all_notifications,
                reader::commands::get_total_count,
                reader::commands::get_database_size,
                reader::commands::import_notifications,
                reader::commands::get_config,
                reader::commands::set_config,
            ])
            .setup(move |app, _api| {
                utils::logging::init();

                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = app
                        .path()
                        .app_data_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    std::fs::create_dir_all(&app_data_dir)?;

                    let db_path = match database_file {
                        Some(path) if path.is_absolute() => path,
                        Some(path) => app_data_dir.join(path),
                        None => app_data_dir.join(DEFAULT_DATABASE_FILE),
                    };
                    if let Some(parent) = db_path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }

                    let database = Database::new(db_path)?;
                    let config = ConfigStore::new(app_data_dir.join(CONFIG_FILE))?;
                    let source = source.unwrap_or_else(|| Arc::new(UnsupportedSource));
                    let reader = NotificationReader::new(database, config, source);

                    let cancel_token = CancellationToken::new();
                    let handle = app.clone();
                    tauri::async_runtime::spawn(reader::forward_posted(
                        reader.subscribe(),
                        cancel_token.clone(),
                        move |record| {
                            handle
                                .emit(NOTIFICATION_POSTED_EVENT, record)
                                .map_err(|err| err.to_string())
                        },
                    ));

                    app.manage(reader);
                    app.manage(PostedForwarder(cancel_token));
                    info!("Notification reader ready");
                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .on_drop(|app| {
                if let Some(forwarder) = app.try_state::<PostedForwarder>() {
                    forwarder.0.cancel();
                }
            })
            .build()
    }
}
