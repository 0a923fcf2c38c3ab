//! # Clock Abstraction for Test Determinism
//!
//! This module provides a Clock trait that can be implemented for both real-time
//! and virtual-time execution, enabling deterministic testing of time-dependent code.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Clock trait for time abstraction
#[async_trait]
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> Instant;

    /// Suspend the calling task for the specified duration
    async fn sleep(&self, duration: Duration);
}

/// Real-time clock backed by the tokio timer
pub struct TokioClock;

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock for deterministic testing
pub struct TestClock {
    current_time: parking_lot::Mutex<Instant>,
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            current_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    pub fn new_with_start_time(start_time: Instant) -> Self {
        Self {
            current_time: parking_lot::Mutex::new(start_time),
        }
    }

    /// Advance the virtual clock by the specified duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock();
        *time += duration;
    }

    /// Set the virtual clock to a specific time
    pub fn set_time(&self, time: Instant) {
        let mut current = self.current_time.lock();
        *current = time;
    }
}

#[async_trait]
impl Clock for TestClock {
    fn now(&self) -> Instant {
        *self.current_time.lock()
    }

    async fn sleep(&self, duration: Duration) {
        // In virtual time, sleep advances the clock and yields so that
        // sibling tasks on the cooperative scheduler get a turn
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

/// Thread-safe clock that can be shared across tasks
pub type SharedClock = std::sync::Arc<dyn Clock + Send + Sync>;

/// Create a real-time clock
pub fn tokio_clock() -> SharedClock {
    std::sync::Arc::new(TokioClock::new())
}

/// Create a test clock
pub fn test_clock() -> SharedClock {
    std::sync::Arc::new(TestClock::new())
}

/// Create a test clock with specific start time
pub fn test_clock_with_start(start_time: Instant) -> SharedClock {
    std::sync::Arc::new(TestClock::new_with_start_time(start_time))
}
