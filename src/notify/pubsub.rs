//! Redis pub/sub publisher for price events
//!
//! Price events are JSON-encoded and PUBLISHed to a single channel. The
//! connection is established once at startup with a bounded health check;
//! publish failures are logged by the router and never retried.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::{EventPublisher, NotifyError, PriceEvent};

/// Bound on connection establishment and the startup PING probe
const STARTUP_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Publishes price events to a Redis pub/sub channel
pub struct RedisPublisher {
    conn: ConnectionManager,
    channel: String,
}

impl RedisPublisher {
    /// Connect to Redis at `url` and verify the connection with a PING
    ///
    /// Both steps are bounded by a 15 second timeout; a failure here is a
    /// fatal startup error for the process.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Redis` on connection or PING failure and
    /// `NotifyError::Timeout` if the probe does not finish in time.
    pub async fn connect(url: &str, channel: &str) -> Result<Self, NotifyError> {
        let client = redis::Client::open(url)?;

        let mut conn = tokio::time::timeout(STARTUP_PROBE_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| NotifyError::Timeout(STARTUP_PROBE_TIMEOUT))??;

        tokio::time::timeout(STARTUP_PROBE_TIMEOUT, async {
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(pong)
        })
        .await
        .map_err(|_| NotifyError::Timeout(STARTUP_PROBE_TIMEOUT))??;

        tracing::debug!(channel = %channel, "redis publisher connected");

        Ok(Self {
            conn,
            channel: channel.to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, event: &PriceEvent, timeout: Duration) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.conn.clone();
        let channel = self.channel.clone();

        tokio::time::timeout(timeout, async move {
            let _: () = conn.publish(channel, payload).await?;
            Ok::<_, redis::RedisError>(())
        })
        .await
        .map_err(|_| NotifyError::Timeout(timeout))??;

        Ok(())
    }

    async fn close(&self) {
        tracing::debug!("redis publisher released");
    }
}
