use crate::config::DispatchConfig;
use crate::dispatch::{DispatchReport, DispatchRequest, DispatchResult};
use crate::error::Result;
use crate::logging::Timer;
use crate::slack::{ChannelId, OutgoingMessage, SlackApi};
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Turns the caller's message into the text actually posted
#[derive(Debug, Clone, Default)]
pub struct MessageDecorator {
    /// Append a "Sent at" footer
    pub stamp: bool,
    pub username: Option<String>,
}

impl MessageDecorator {
    pub fn render(&self, message: &str, now: DateTime<Utc>) -> String {
        if self.stamp {
            format!(
                "{}\n\nSent at: {}",
                message,
                now.format("%Y-%m-%d %H:%M:%S UTC")
            )
        } else {
            message.to_string()
        }
    }
}

/// Sends one message to many destinations, each independently
pub struct Dispatcher {
    api: Arc<dyn SlackApi>,
    max_concurrency: usize,
    decorator: MessageDecorator,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn SlackApi>, config: &DispatchConfig) -> Self {
        Self {
            api,
            max_concurrency: config.max_concurrency.max(1),
            decorator: MessageDecorator {
                stamp: config.stamp_messages,
                username: config.username.clone(),
            },
        }
    }

    /// Validate, then post to every destination.
    ///
    /// Invalid input fails before Slack is called. Individual send failures
    /// only show up in the report.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchReport> {
        let batch = request.validate()?;
        let dispatch_id = Uuid::new_v4();

        let span = tracing::info_span!(
            "dispatch",
            dispatch_id = %dispatch_id,
            destinations = batch.destinations.len(),
        );

        async move {
            let _timer = Timer::new("dispatch");
            tracing::info!(
                concurrency = self.max_concurrency,
                message_len = batch.message.len(),
                "Dispatching message"
            );

            let text = self.decorator.render(&batch.message, Utc::now());
            let results = self.send_all(&batch.destinations, &text).await;
            let report = DispatchReport::new(dispatch_id, results);

            tracing::info!(
                succeeded = report.summary.successful,
                failed = report.summary.failed,
                total = report.summary.total,
                success_rate = report.success_rate(),
                "Dispatch summary"
            );

            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Sends run concurrently; each result lands in the slot of its input position
    async fn send_all(&self, destinations: &[ChannelId], text: &str) -> Vec<DispatchResult> {
        let mut slots: Vec<Option<DispatchResult>> = vec![None; destinations.len()];

        let mut sends = stream::iter(destinations.iter().cloned().enumerate())
            .map(|(index, destination)| async move {
                (index, self.send_one(&destination, text).await)
            })
            .buffer_unordered(self.max_concurrency);

        while let Some((index, result)) = sends.next().await {
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .zip(destinations)
            .map(|(slot, destination)| {
                slot.unwrap_or_else(|| DispatchResult::failed(destination, "not_sent"))
            })
            .collect()
    }

    async fn send_one(&self, destination: &ChannelId, text: &str) -> DispatchResult {
        let message = OutgoingMessage {
            channel: destination.clone(),
            text: text.to_string(),
            username: self.decorator.username.clone(),
        };

        match self.api.post_message(&message).await {
            Ok(ts) => {
                tracing::debug!(
                    channel_id = %destination,
                    ts = %ts.as_str(),
                    "Message sent"
                );
                DispatchResult::sent(destination)
            }
            Err(e) => {
                tracing::warn!(
                    channel_id = %destination,
                    error = %e,
                    "Failed to send message"
                );
                DispatchResult::failed(destination, e.detail())
            }
        }
    }
}
