//! # Ticketer Core
//!
//! Core traits and types for the Ticketer form controller.
//!
//! This crate provides the abstractions the registration form is built from:
//! a pure reducer that owns all form logic, effect descriptions for the work
//! that has to happen outside of it, and the environment traits through which
//! that work reaches the outside world.
//!
//! ## Core Concepts
//!
//! - **State**: The form, its per-field errors and the generated code
//! - **Action**: Every input to the reducer (field edits, generate, download, completions)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected collaborators (clock, code encoder, file saver)
//!
//! ## Example
//!
//! ```ignore
//! use ticketer_core::*;
//!
//! impl Reducer for FormReducer {
//!     type State = FormState;
//!     type Action = FormAction;
//!     type Environment = FormEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut FormState,
//!         action: FormAction,
//!         env: &FormEnvironment,
//!     ) -> SmallVec<[Effect<FormAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Declarative macros for building effects
pub mod effect_macros;

/// `data:` URIs carrying rendered images
pub mod data_uri;

pub use data_uri::{DataUri, DataUriError};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce zero or one effect, so the result is inline
        /// up to four effects before spilling to the heap.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Whether executing this effect does nothing at all
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Error types for environment collaborators
pub mod error {
    use thiserror::Error;

    /// Errors produced while rendering a payload into a scannable image
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum EncodeError {
        /// The payload could not be represented as a code (e.g. too long)
        #[error("payload cannot be encoded: {0}")]
        Payload(String),

        /// The code was built but rasterising it failed
        #[error("failed to render image: {0}")]
        Render(String),

        /// The background encoding task did not finish
        #[error("encoding task failed: {0}")]
        Task(String),
    }

    /// Errors produced while saving a rendered image
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum SaveError {
        /// The stored image could not be decoded back into bytes
        #[error("invalid image data: {0}")]
        InvalidData(#[from] crate::data_uri::DataUriError),

        /// The file name is empty or would escape the download directory
        #[error("invalid file name: {0:?}")]
        InvalidFileName(String),

        /// Writing the file failed
        #[error("failed to write file: {0}")]
        Io(String),
    }
}

/// Environment module - Dependency injection traits
///
/// All external collaborators are abstracted behind traits and injected
/// via the Environment parameter. Production implementations live in the
/// application crate, deterministic ones in `ticketer-testing`.
pub mod environment {
    use super::error::{EncodeError, SaveError};
    use crate::data_uri::DataUri;
    use chrono::{DateTime, Utc};
    use std::future::Future;
    use std::path::PathBuf;
    use std::pin::Pin;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Renders a text payload as a scannable raster image.
    ///
    /// Uses explicit `Pin<Box<dyn Future>>` returns so the encoder can be held
    /// as `Arc<dyn CodeEncoder>` in an environment.
    pub trait CodeEncoder: Send + Sync {
        /// Encode `payload` into an image, returned as a self-contained `data:` URI.
        ///
        /// # Errors
        ///
        /// Returns [`EncodeError`] if the payload cannot be represented or the
        /// image cannot be rendered.
        fn encode(
            &self,
            payload: String,
        ) -> Pin<Box<dyn Future<Output = Result<DataUri, EncodeError>> + Send + '_>>;
    }

    /// Persists a rendered image on behalf of the user.
    pub trait FileSaver: Send + Sync {
        /// Save `image` under `file_name`, returning where it ended up.
        ///
        /// # Errors
        ///
        /// Returns [`SaveError`] if the image cannot be decoded or written.
        fn save(
            &self,
            image: DataUri,
            file_name: String,
        ) -> Pin<Box<dyn Future<Output = Result<PathBuf, SaveError>> + Send + '_>>;
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn none_effect_is_none() {
        let effect: Effect<()> = Effect::None;
        assert!(effect.is_none());
        assert_eq!(format!("{effect:?}"), "Effect::None");
    }

    #[test]
    fn future_effect_is_not_none() {
        let effect: Effect<()> = Effect::Future(Box::pin(async { None }));
        assert!(!effect.is_none());
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }
}
