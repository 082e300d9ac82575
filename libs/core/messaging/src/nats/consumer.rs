//! JetStream queue consumer with an explicit connection lifecycle.

use crate::handler::{AckDecision, MessageHandler};
use crate::nats::config::WorkerConfig;
use crate::nats::dlq::{DlqEntry, DlqManager};
use crate::nats::error::NatsError;
use crate::nats::metrics::QueueMetrics;
use crate::{Job, Processor};
use async_nats::jetstream::consumer::{pull, AckPolicy, PullConsumer};
use async_nats::jetstream::stream::{Config as JsStreamConfig, RetentionPolicy};
use async_nats::jetstream::{self, AckKind, Context};
use async_nats::Client;
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Lifecycle of a [`QueueConsumer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerState {
    Idle,
    Connected,
    Consuming,
    Closed,
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsumerState::Idle => "idle",
            ConsumerState::Connected => "connected",
            ConsumerState::Consuming => "consuming",
            ConsumerState::Closed => "closed",
        };
        f.write_str(name)
    }
}

enum Inner {
    Idle,
    Connected {
        client: Client,
    },
    Consuming {
        client: Client,
        shutdown_tx: watch::Sender<bool>,
        task: JoinHandle<Result<(), NatsError>>,
    },
    Closed,
}

impl Inner {
    fn state(&self) -> ConsumerState {
        match self {
            Inner::Idle => ConsumerState::Idle,
            Inner::Connected { .. } => ConsumerState::Connected,
            Inner::Consuming { .. } => ConsumerState::Consuming,
            Inner::Closed => ConsumerState::Closed,
        }
    }
}

/// Durable queue consumer.
///
/// `Idle -> connect() -> Connected -> start() -> Consuming -> close() -> Closed`.
///
/// Messages are handled strictly one at a time by a single background task.
/// Each [`AckDecision`] maps onto JetStream as:
/// - `Ack` → `ack`
/// - `Nack { requeue: true }` → `Nak(delay)`
/// - `Nack { requeue: false }` → dead letter, then `Term`
pub struct QueueConsumer<J: Job, P: Processor<J>> {
    url: String,
    config: WorkerConfig,
    handler: Arc<MessageHandler<J, P>>,
    inner: Inner,
    state_tx: watch::Sender<ConsumerState>,
}

impl<J: Job, P: Processor<J> + 'static> QueueConsumer<J, P> {
    pub fn new(url: impl Into<String>, config: WorkerConfig, processor: P) -> Self {
        let handler = Arc::new(MessageHandler::new(processor, config.max_deliver));
        let (state_tx, _) = watch::channel(ConsumerState::Idle);

        Self {
            url: url.into(),
            config,
            handler,
            inner: Inner::Idle,
            state_tx,
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.inner.state()
    }

    /// Live view of the lifecycle state, for readiness probes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConsumerState> {
        self.state_tx.subscribe()
    }

    fn transition(&mut self, inner: Inner) {
        self.inner = inner;
        self.state_tx.send_replace(self.inner.state());
    }

    /// Open the broker connection. Failure leaves the consumer `Idle`.
    pub async fn connect(&mut self) -> Result<(), NatsError> {
        if !matches!(self.inner, Inner::Idle) {
            return Err(NatsError::InvalidState {
                operation: "connect",
                state: self.state(),
            });
        }

        info!(
            consumer = %self.config.consumer_name,
            timeout_ms = self.config.connect_timeout.as_millis() as u64,
            "Connecting to NATS"
        );

        let client = async_nats::ConnectOptions::new()
            .name(&self.config.consumer_name)
            .connection_timeout(self.config.connect_timeout)
            .connect(self.url.as_str())
            .await?;

        info!("Connected to NATS");
        self.transition(Inner::Connected { client });
        Ok(())
    }

    /// Declare the queue, its consumer and dead letter stream, then spawn the
    /// receive loop.
    pub async fn start(&mut self) -> Result<(), NatsError> {
        let client = match &self.inner {
            Inner::Connected { client } => client.clone(),
            other => {
                return Err(NatsError::InvalidState {
                    operation: "start",
                    state: other.state(),
                })
            }
        };

        let jetstream = jetstream::new(client.clone());
        let consumer = self.declare(&jetstream).await?;

        let dlq = DlqManager::new(jetstream, &self.config);
        dlq.ensure_stream().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let receive_loop = ReceiveLoop {
            consumer,
            dlq,
            handler: self.handler.clone(),
            metrics: QueueMetrics::new(&self.config.stream_name, self.handler.processor().name()),
            config: self.config.clone(),
        };
        let task = tokio::spawn(receive_loop.run(shutdown_rx));

        info!(
            stream = %self.config.stream_name,
            queue = %self.config.subject,
            consumer = %self.config.consumer_name,
            max_deliver = self.config.max_deliver,
            "Queue consumer started"
        );

        self.transition(Inner::Consuming {
            client,
            shutdown_tx,
            task,
        });
        Ok(())
    }

    async fn declare(&self, jetstream: &Context) -> Result<PullConsumer, NatsError> {
        let stream = jetstream
            .get_or_create_stream(JsStreamConfig {
                name: self.config.stream_name.clone(),
                subjects: vec![self.config.subject.clone()],
                retention: RetentionPolicy::WorkQueue,
                max_messages: self.config.max_messages,
                max_age: self.config.max_age,
                ..Default::default()
            })
            .await
            .map_err(NatsError::from_jetstream_error)?;

        stream
            .get_or_create_consumer(
                &self.config.consumer_name,
                pull::Config {
                    durable_name: Some(self.config.consumer_name.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: self.config.ack_wait,
                    max_deliver: i64::from(self.config.max_deliver),
                    filter_subject: self.config.subject.clone(),
                    ..Default::default()
                },
            )
            .await
            .map_err(NatsError::from_jetstream_error)
    }

    /// Resolve once the receive loop stops. Returns immediately when the
    /// consumer is not consuming.
    pub async fn wait_forever(&mut self) -> Result<(), NatsError> {
        let joined = match &mut self.inner {
            Inner::Consuming { task, .. } => task.await,
            _ => return Ok(()),
        };

        if let Inner::Consuming { client, .. } = std::mem::replace(&mut self.inner, Inner::Closed) {
            self.transition(Inner::Connected { client });
        }

        joined.map_err(|e| NatsError::Worker(e.to_string()))?
    }

    /// Stop receiving, let the in-flight message finish, then drop the
    /// connection. Calling this in any state, any number of times, is fine.
    pub async fn close(&mut self) -> Result<(), NatsError> {
        let result = match std::mem::replace(&mut self.inner, Inner::Closed) {
            Inner::Idle | Inner::Closed => Ok(()),
            Inner::Connected { client } => self.flush(&client).await,
            Inner::Consuming {
                client,
                shutdown_tx,
                task,
            } => {
                info!("Stopping queue consumer");
                let _ = shutdown_tx.send(true);

                let joined = match task.await {
                    Ok(result) => result,
                    Err(e) => Err(NatsError::Worker(e.to_string())),
                };
                let flushed = self.flush(&client).await;
                joined.and(flushed)
            }
        };

        self.state_tx.send_replace(ConsumerState::Closed);
        result
    }

    async fn flush(&self, client: &Client) -> Result<(), NatsError> {
        match tokio::time::timeout(self.config.connect_timeout, client.flush()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(NatsError::consumer_error(format!("flush failed: {}", e))),
            Err(_) => Err(NatsError::consumer_error("flush timed out")),
        }
    }
}

struct ReceiveLoop<J: Job, P: Processor<J>> {
    consumer: PullConsumer,
    dlq: DlqManager,
    handler: Arc<MessageHandler<J, P>>,
    metrics: QueueMetrics,
    config: WorkerConfig,
}

impl<J: Job, P: Processor<J> + 'static> ReceiveLoop<J, P> {
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), NatsError> {
        'receive: loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let pulled = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break 'receive,
                pulled = self
                    .consumer
                    .batch()
                    .max_messages(self.config.batch_size)
                    .expires(self.config.fetch_timeout)
                    .messages() => pulled,
            };

            let mut messages = match pulled {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(error = %e, "Failed to pull messages, backing off");
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => break 'receive,
                        _ = tokio::time::sleep(self.config.error_backoff) => continue 'receive,
                    }
                }
            };

            loop {
                let next = tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break 'receive,
                    next = messages.next() => next,
                };

                match next {
                    // Not raced against shutdown: the current message always finishes.
                    Some(Ok(message)) => self.process(message).await,
                    Some(Err(e)) => {
                        warn!(error = %e, "Error receiving message");
                        break;
                    }
                    None => break,
                }
            }
        }

        info!(stream = %self.config.stream_name, "Receive loop stopped");
        Ok(())
    }

    async fn process(&self, message: jetstream::Message) {
        self.metrics.message_received();

        let (sequence, attempt) = match message.info() {
            Ok(info) => (
                info.stream_sequence,
                u32::try_from(info.delivered).unwrap_or(u32::MAX).max(1),
            ),
            Err(e) => {
                warn!(error = %e, "Missing delivery metadata, assuming first attempt");
                (0, 1)
            }
        };

        let started = Instant::now();
        let decision = self.handler.handle(&message.payload, attempt).await;

        let acked = match decision {
            AckDecision::Ack => {
                self.metrics.message_acked(started.elapsed());
                message.ack().await
            }
            AckDecision::Nack {
                requeue: true,
                delay,
                ..
            } => {
                self.metrics.message_requeued();
                message.ack_with(AckKind::Nak(Some(delay))).await
            }
            AckDecision::Nack {
                requeue: false,
                reason,
                ..
            } => {
                let entry = DlqEntry::new(
                    &self.config.stream_name,
                    &message.payload,
                    reason,
                    sequence,
                    attempt,
                );
                if let Err(e) = self.dlq.publish(&entry).await {
                    error!(error = %e, sequence, "Failed to publish dead letter");
                }
                self.metrics.message_dead_lettered();
                message.ack_with(AckKind::Term).await
            }
        };

        if let Err(e) = acked {
            warn!(error = %e, sequence, "Failed to acknowledge message");
        }
    }
}
