//! # Ticketer Testing
//!
//! Testing utilities and helpers for the Ticketer form controller.
//!
//! This crate provides:
//! - Deterministic implementations of the Environment traits
//! - A Given-When-Then harness for reducers
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use ticketer_testing::{test_clock, MockCodeEncoder, RecordingFileSaver};
//! use ticketer_runtime::Store;
//!
//! #[tokio::test]
//! async fn generates_code() {
//!     let encoder = MockCodeEncoder::new();
//!     let env = TicketFormEnvironment::new(
//!         Arc::new(encoder.clone()),
//!         Arc::new(RecordingFileSaver::new()),
//!         Arc::new(test_clock()),
//!         FormSettings::default(),
//!     );
//!     let store = Store::new(TicketFormState::default(), TicketFormReducer::new(), env);
//!     // ...
//!     assert_eq!(encoder.payloads().len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use ticketer_core::environment::Clock;

pub mod collaborator_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticketer_testing::mocks::FixedClock;
    /// use ticketer_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing strategies
pub mod properties {
    use proptest::prelude::*;

    /// Integers inside the inclusive range `[min, max]`
    pub fn roll_numbers_within(min: i64, max: i64) -> impl Strategy<Value = i64> {
        min..=max
    }

    /// Integers strictly outside `[min, max]`, biased towards the boundaries
    pub fn roll_numbers_outside(min: i64, max: i64) -> impl Strategy<Value = i64> {
        prop_oneof![
            Just(min.saturating_sub(1)),
            Just(max.saturating_add(1)),
            (min.saturating_sub(1_000_000)..min),
            (max.saturating_add(1)..max.saturating_add(1_000_000)),
            Just(0_i64),
            Just(-1_i64),
        ]
        .prop_filter("must lie outside the range", move |n| *n < min || *n > max)
    }

    /// Text that never parses as a finite number
    pub fn non_numeric_text() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9 _.-]{0,12}"
    }

    /// Non-empty text, including whitespace-only strings
    pub fn non_empty_text() -> impl Strategy<Value = String> {
        prop_oneof![" {1,4}", "[a-zA-Z@. ]{1,20}"]
    }
}

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use collaborator_mocks::{EncoderCall, MockCodeEncoder, RecordingFileSaver, SavedFile};
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
