//! Reconnecting push-channel client
//!
//! Maintains one live connection per subscription (channel x organization),
//! decodes incoming frames, and fans recognized events out on a broadcast
//! channel. Transport loss is absorbed: the worker backs off exponentially
//! (capped at 10s) and reconnects until the client is closed. The lifecycle
//! is an explicit phase machine driven by a single owned task; the backoff
//! timer is cancellable, and a shutdown flag is checked at every transport
//! callback so a close can never be outrun by an in-flight connect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, Notify, RwLock};
use tracing::{debug, info, warn};

use crate::config::StreamConfig;
use crate::events::{decode_frame, is_pending_tick, DecodedFrame, PushEvent};
use crate::io::{ConnectionFactory, ConnectionPair, TcpConnectionFactory};

/// Which push feed a client subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Monitors,
    Incidents,
}

impl Channel {
    /// Subscribe line sent on connect, standing in for the channel path
    pub(crate) fn subscribe_path(&self, organization_id: &str) -> String {
        match self {
            Channel::Monitors => format!("monitors/{}", organization_id),
            Channel::Incidents => format!("incidents/{}", organization_id),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Monitors => write!(f, "monitors"),
            Channel::Incidents => write!(f, "incidents"),
        }
    }
}

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    BackingOff,
    Closed,
}

/// Reconnect delay for the given post-increment attempt count
///
/// attempt 1 -> 2s, 2 -> 4s, 3 -> 8s, capped at 10s thereafter.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let millis = 1000u64.saturating_mul(2u64.saturating_pow(attempt.min(16)));
    Duration::from_millis(millis.min(10_000))
}

/// Client for one push feed subscription
pub struct StreamClient {
    config: StreamConfig,
    channel: Channel,
    phase: Arc<RwLock<StreamPhase>>,
    event_sender: broadcast::Sender<PushEvent>,
    shutdown: Arc<AtomicBool>,
    stop: Arc<Notify>,
    worker_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    factory: Arc<dyn ConnectionFactory>,
}

impl StreamClient {
    /// Create a stream client with the default TCP connection factory
    pub fn new(config: StreamConfig, channel: Channel) -> Self {
        Self::with_connection_factory(config, channel, Arc::new(TcpConnectionFactory::new()))
    }

    /// Create a stream client with a custom connection factory
    ///
    /// This is useful for testing with mock connections.
    pub fn with_connection_factory(
        config: StreamConfig,
        channel: Channel,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Self {
        let (event_sender, _) = broadcast::channel(100);
        Self {
            config,
            channel,
            phase: Arc::new(RwLock::new(StreamPhase::Disconnected)),
            event_sender,
            shutdown: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(Notify::new()),
            worker_handle: Mutex::new(None),
            factory,
        }
    }

    /// Subscribe to decoded push events
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.event_sender.subscribe()
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> StreamPhase {
        *self.phase.read().await
    }

    /// Whether a live connection is currently established
    pub async fn is_connected(&self) -> bool {
        self.phase().await == StreamPhase::Connected
    }

    /// Open the subscription for the given organization
    ///
    /// An empty organization id is a silent no-op: no connection attempt is
    /// made. Callers that may race a logout are expected to guard for it.
    /// A client whose worker is already running ignores further opens; one
    /// client owns at most one transport until closed.
    pub async fn open(&self, organization_id: &str) {
        if organization_id.is_empty() {
            debug!("No organization id, skipping {} stream", self.channel);
            return;
        }

        let mut guard = self.worker_handle.lock().await;
        if guard.is_some() {
            warn!("{} stream already open, ignoring", self.channel);
            return;
        }

        let worker = StreamWorker {
            addr: format!("{}:{}", self.config.host, self.config.port),
            subscribe_path: self.channel.subscribe_path(organization_id),
            channel: self.channel,
            connect_timeout: Duration::from_secs(self.config.connection_timeout_seconds),
            phase: self.phase.clone(),
            event_sender: self.event_sender.clone(),
            shutdown: self.shutdown.clone(),
            stop: self.stop.clone(),
            factory: self.factory.clone(),
        };

        *guard = Some(tokio::spawn(worker.run()));
    }

    /// Close the subscription
    ///
    /// Suppresses all further reconnects, cancels a pending backoff timer,
    /// and tears down the live transport. Idempotent, and safe to call
    /// before any connection attempt completes.
    pub async fn close(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.stop.notify_waiters();

        let handle = self.worker_handle.lock().await.take();
        if let Some(handle) = handle {
            // The worker exits on its own at the next checkpoint; the abort
            // is a backstop for a worker parked inside a connect call.
            handle.abort();
            let _ = handle.await;
        }

        *self.phase.write().await = StreamPhase::Closed;
        debug!("Closed {} stream", self.channel);
    }
}

/// State owned by the connection task
struct StreamWorker {
    addr: String,
    subscribe_path: String,
    channel: Channel,
    connect_timeout: Duration,
    phase: Arc<RwLock<StreamPhase>>,
    event_sender: broadcast::Sender<PushEvent>,
    shutdown: Arc<AtomicBool>,
    stop: Arc<Notify>,
    factory: Arc<dyn ConnectionFactory>,
}

impl StreamWorker {
    async fn run(self) {
        let mut attempt = 0u32;

        loop {
            if self.is_shut_down() {
                break;
            }

            self.set_phase(StreamPhase::Connecting).await;
            match self.factory.connect(&self.addr, self.connect_timeout).await {
                Ok(pair) => {
                    attempt = 0;
                    self.serve(pair).await;
                }
                Err(e) => {
                    debug!("Connection to {} failed: {}", self.addr, e);
                }
            }

            if self.is_shut_down() {
                break;
            }

            attempt += 1;
            let delay = backoff_delay(attempt);
            info!(
                "Reconnecting {} stream in {:?} (attempt {})",
                self.channel, delay, attempt
            );
            self.set_phase(StreamPhase::BackingOff).await;
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.stop.notified() => break,
            }
        }

        self.set_phase(StreamPhase::Closed).await;
    }

    /// Run one established connection until it drops or the client closes
    async fn serve(&self, pair: ConnectionPair) {
        let ConnectionPair {
            mut reader,
            mut writer,
        } = pair;

        if self.is_shut_down() {
            let _ = writer.shutdown().await;
            return;
        }

        if let Err(e) = writer.write_frame(&self.subscribe_path).await {
            warn!("Subscribe handshake failed: {}", e);
            return;
        }

        self.set_phase(StreamPhase::Connected).await;
        info!("Connected to {} stream at {}", self.channel, self.addr);

        loop {
            tokio::select! {
                frame = reader.read_frame() => match frame {
                    Ok(Some(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        if self.is_shut_down() {
                            break;
                        }
                        self.handle_frame(&line);
                    }
                    Ok(None) => {
                        warn!("{} stream closed by remote", self.channel);
                        break;
                    }
                    Err(e) => {
                        warn!("{} stream read error: {}", self.channel, e);
                        break;
                    }
                },
                _ = self.stop.notified() => break,
            }
        }

        let _ = writer.shutdown().await;
    }

    fn handle_frame(&self, line: &str) {
        match decode_frame(line) {
            DecodedFrame::Event(PushEvent::MonitorUpdate(monitor))
                if self.channel == Channel::Monitors && is_pending_tick(&monitor) =>
            {
                debug!("Dropping pending tick for monitor {}", monitor.id);
            }
            DecodedFrame::Event(event) => {
                let _ = self.event_sender.send(event);
            }
            DecodedFrame::Unknown(kind) => {
                debug!("Ignoring frame with unrecognized type: {}", kind);
            }
            DecodedFrame::Malformed(e) => {
                debug!("Failed to decode push frame: {}", e);
            }
        }
    }

    fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    async fn set_phase(&self, phase: StreamPhase) {
        // Once closed, stay closed; a straggling callback must not revive
        // the phase after close().
        let mut guard = self.phase.write().await;
        if *guard != StreamPhase::Closed || phase == StreamPhase::Closed {
            *guard = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay_curve() {
        assert_eq!(backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(3), Duration::from_millis(8000));
        assert_eq!(backoff_delay(4), Duration::from_millis(10_000));
        assert_eq!(backoff_delay(10), Duration::from_millis(10_000));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn test_subscribe_paths() {
        assert_eq!(
            Channel::Monitors.subscribe_path("org-1"),
            "monitors/org-1"
        );
        assert_eq!(
            Channel::Incidents.subscribe_path("org-1"),
            "incidents/org-1"
        );
    }

    #[test]
    fn test_initial_phase() {
        assert_eq!(StreamPhase::default(), StreamPhase::Disconnected);
    }
}
