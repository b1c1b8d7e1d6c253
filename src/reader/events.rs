use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::db::NotificationRecord;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Event emitted to the webview for every captured notification.
pub const NOTIFICATION_POSTED_EVENT: &str = "notificationPosted";

/// Relays captured records from the broadcast channel to `emit` until
/// cancelled or the channel closes.
///
/// A failing `emit` is logged and skipped. When this task falls behind, the
/// oldest events are dropped rather than slowing down capture.
pub async fn forward_posted<F>(
    mut receiver: broadcast::Receiver<NotificationRecord>,
    cancel_token: CancellationToken,
    emit: F,
) where
    F: Fn(&NotificationRecord) -> Result<(), String> + Send + 'static,
{
    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Ok(record) => {
                    if let Err(err) = emit(&record) {
                        log_error!("failed to emit {} for {}: {err}", NOTIFICATION_POSTED_EVENT, record.id);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("event forwarder lagged; dropped {skipped} notifications");
                }
                Err(RecvError::Closed) => break,
            },
            _ = cancel_token.cancelled() => {
                log_info!("notification event forwarder shutting down");
                break;
            }
        }
    }
}
