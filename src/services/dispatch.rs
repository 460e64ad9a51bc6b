use crate::domain::models::{ActionAck, ActionCommand};
use crate::services::api::ApiError;
use crate::services::feed::FeedSynchronizer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Remote end that applies a state-changing command to one record.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn submit(&self, command: &ActionCommand) -> Result<ActionAck, ApiError>;
}

/// Something that can be told to refetch right away.
pub trait FeedRefresh: Sync {
    fn request_refresh(&self) -> Option<u64>;
}

impl FeedRefresh for FeedSynchronizer {
    fn request_refresh(&self) -> Option<u64> {
        self.refresh()
    }
}

#[derive(Debug)]
pub struct Dispatched {
    pub ack: ActionAck,
    /// Sequence number of the refresh issued after the command succeeded.
    pub refresh_sequence: Option<u64>,
}

pub struct ActionDispatcher {
    sink: Arc<dyn ActionSink>,
}

impl ActionDispatcher {
    pub fn new(sink: Arc<dyn ActionSink>) -> Self {
        Self { sink }
    }

    /// Submits `command`; on success the feed is refetched instead of patched,
    /// since the new status and score only exist on the server.
    pub async fn dispatch(
        &self,
        command: ActionCommand,
        feed: &dyn FeedRefresh,
    ) -> Result<Dispatched, ApiError> {
        match self.sink.submit(&command).await {
            Ok(ack) => {
                let refresh_sequence = feed.request_refresh();
                info!(
                    target_id = command.target_id,
                    action = ?command.kind,
                    refresh_sequence,
                    "action applied"
                );
                Ok(Dispatched {
                    ack,
                    refresh_sequence,
                })
            }
            Err(err) => {
                warn!(
                    target_id = command.target_id,
                    action = ?command.kind,
                    error = %err,
                    "action rejected"
                );
                Err(err)
            }
        }
    }
}
