//! Injectable waiting.

use std::time::Duration;

/// Something that can wait. The loop does all of its waiting through this.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(300)).await;
        assert!(start.elapsed() >= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_zero_duration_returns_immediately() {
        TokioSleeper.sleep(Duration::ZERO).await;
    }
}
