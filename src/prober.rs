use crate::types::{ScanOutcome, ScanStatus, ScanTask};
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Upper bound on bytes kept from a banner.
pub const BANNER_MAX_BYTES: usize = 1024;

/// Delay inserted between a failed attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^attempt`, saturating.
    Exponential { base: Duration },
    Fixed(Duration),
    None,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Exponential {
            base: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Delay after failed attempt `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Exponential { base } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
            Backoff::Fixed(d) => d,
            Backoff::None => Duration::ZERO,
        }
    }
}

/// Opens the transport for one attempt. Every error counts as a failed attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + Unpin + Send;

    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> io::Result<Self::Stream>;
}

/// Plain TCP connect. Name resolution happens inside the timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
        connect_within(timeout, TcpStream::connect((host, port))).await
    }
}

/// Bound `connect` by `timeout`. A zero timeout means no per-attempt limit.
pub async fn connect_within<F, T>(timeout: Duration, connect: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    if timeout.is_zero() {
        return connect.await;
    }
    time::timeout(timeout, connect)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timeout"))?
}

/// Tunables for a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub connect_timeout: Duration,
    /// Maximum number of connect attempts (R). Always at least 1 in practice.
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub grab_banner: bool,
    pub banner_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_attempts: 3,
            backoff: Backoff::default(),
            grab_banner: true,
            banner_timeout: Duration::from_secs(2),
        }
    }
}

/// Runs one scan task: connect with retries, then an optional banner read.
#[derive(Debug, Clone)]
pub struct ConnectionProber<C = TcpConnector> {
    connector: C,
    settings: ProbeSettings,
}

impl ConnectionProber<TcpConnector> {
    pub fn new(settings: ProbeSettings) -> Self {
        Self::with_connector(TcpConnector, settings)
    }
}

impl<C: Connector> ConnectionProber<C> {
    pub fn with_connector(connector: C, settings: ProbeSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe without any external cancellation.
    pub async fn probe(&self, task: ScanTask) -> ScanOutcome {
        self.probe_with_cancel(task, &CancellationToken::new()).await
    }

    /// Probe `task`, giving up at the next connect or backoff wait once `cancel` fires.
    ///
    /// The returned outcome is `Open` with `attempts = i + 1` on the first successful
    /// connect, otherwise `Closed` with the number of attempts made.
    pub async fn probe_with_cancel(
        &self,
        task: ScanTask,
        cancel: &CancellationToken,
    ) -> ScanOutcome {
        let start = Instant::now();
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempts = 0;

        for attempt in 0..max_attempts {
            if cancel.is_cancelled() {
                break;
            }
            attempts = attempt + 1;

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.connector.connect(
                    &task.host,
                    task.port,
                    self.settings.connect_timeout,
                ) => res,
            };

            match result {
                Ok(mut stream) => {
                    let banner = if self.settings.grab_banner {
                        read_banner(&mut stream, self.settings.banner_timeout).await
                    } else {
                        None
                    };
                    drop(stream);
                    match &banner {
                        Some(b) => info!("{task} open, banner: {b}"),
                        None => info!("{task} open"),
                    }
                    return ScanOutcome {
                        task,
                        status: ScanStatus::Open,
                        banner,
                        attempts,
                        elapsed: start.elapsed(),
                    };
                }
                Err(e) if attempts < max_attempts => {
                    let wait = self.settings.backoff.delay(attempt);
                    debug!("attempt {attempts} to {task} failed ({e}), waiting {wait:?}");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = time::sleep(wait) => {}
                    }
                }
                Err(e) => {
                    debug!("attempt {attempts} to {task} failed ({e})");
                }
            }
        }

        debug!("{task} closed after {attempts} attempt(s)");
        ScanOutcome {
            task,
            status: ScanStatus::Closed,
            banner: None,
            attempts,
            elapsed: start.elapsed(),
        }
    }
}

/// Best-effort read of whatever the peer sends first, bounded by `deadline`.
///
/// Errors, timeouts and empty reads all yield `None`. The text is lossy UTF-8,
/// trimmed of surrounding whitespace.
pub async fn read_banner<S>(stream: &mut S, deadline: Duration) -> Option<String>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; BANNER_MAX_BYTES];
    match time::timeout(deadline, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            buf.truncate(n);
            let s = String::from_utf8_lossy(&buf).trim().to_string();
            (!s.is_empty()).then_some(s)
        }
        _ => None,
    }
}
