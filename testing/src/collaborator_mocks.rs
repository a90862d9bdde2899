//! In-memory collaborators for deterministic tests
//!
//! - [`MockCodeEncoder`]: records payloads, returns scripted results, and can
//!   hold each call open until the test releases it
//! - [`RecordingFileSaver`]: records every save instead of touching the disk

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use ticketer_core::DataUri;
use ticketer_core::environment::{CodeEncoder, FileSaver};
use ticketer_core::error::{EncodeError, SaveError};
use tokio::sync::{Notify, oneshot};

/// A payload the encoder was asked to render, in call order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderCall {
    /// Zero-based position of the call
    pub index: usize,
    /// The payload text
    pub payload: String,
}

#[derive(Default)]
struct EncoderInner {
    calls: Vec<EncoderCall>,
    scripted: VecDeque<Result<DataUri, EncodeError>>,
    gates: Vec<Option<oneshot::Sender<()>>>,
}

/// Code encoder that never renders anything.
///
/// By default every call succeeds immediately with [`MockCodeEncoder::image_for`]
/// of its payload. Results can be scripted per call, and a gated encoder
/// suspends each call until [`MockCodeEncoder::release`] is called for it,
/// which lets tests choose the order in which concurrent calls complete.
///
/// # Example
///
/// ```
/// use ticketer_testing::MockCodeEncoder;
/// use ticketer_core::environment::CodeEncoder;
///
/// # tokio_test::block_on(async {
/// let encoder = MockCodeEncoder::new();
/// let uri = encoder.encode("hello".to_string()).await.unwrap();
/// assert_eq!(uri, MockCodeEncoder::image_for("hello"));
/// assert_eq!(encoder.payloads(), vec!["hello".to_string()]);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockCodeEncoder {
    inner: Arc<Mutex<EncoderInner>>,
    gated: bool,
    calls_changed: Arc<Notify>,
}

impl MockCodeEncoder {
    /// Encoder whose calls complete immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder whose calls wait for [`MockCodeEncoder::release`]
    #[must_use]
    pub fn gated() -> Self {
        Self {
            gated: true,
            ..Self::default()
        }
    }

    /// The image a successful call returns for `payload`
    #[must_use]
    pub fn image_for(payload: &str) -> DataUri {
        DataUri::png(payload.as_bytes())
    }

    /// Queue the result for the next unscripted call
    pub fn push_result(&self, result: Result<DataUri, EncodeError>) {
        self.inner.lock().unwrap().scripted.push_back(result);
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: EncodeError) {
        self.push_result(Err(error));
    }

    /// All calls so far
    #[must_use]
    pub fn calls(&self) -> Vec<EncoderCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// All payloads so far, in call order
    #[must_use]
    pub fn payloads(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.payload).collect()
    }

    /// Number of calls so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }

    /// Let the call at `index` complete. Returns `false` if there is no such
    /// call or it was already released.
    pub fn release(&self, index: usize) -> bool {
        let gate = self
            .inner
            .lock()
            .unwrap()
            .gates
            .get_mut(index)
            .and_then(Option::take);
        gate.is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Wait until at least `count` calls have been made
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.calls_changed.notified();
            if self.call_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl CodeEncoder for MockCodeEncoder {
    fn encode(
        &self,
        payload: String,
    ) -> Pin<Box<dyn Future<Output = Result<DataUri, EncodeError>> + Send + '_>> {
        let (result, gate) = {
            let mut inner = self.inner.lock().unwrap();
            let index = inner.calls.len();
            inner.calls.push(EncoderCall {
                index,
                payload: payload.clone(),
            });
            let result = inner
                .scripted
                .pop_front()
                .unwrap_or_else(|| Ok(Self::image_for(&payload)));
            let gate = if self.gated {
                let (tx, rx) = oneshot::channel();
                inner.gates.push(Some(tx));
                Some(rx)
            } else {
                inner.gates.push(None);
                None
            };
            (result, gate)
        };
        self.calls_changed.notify_waiters();

        Box::pin(async move {
            if let Some(rx) = gate {
                if rx.await.is_err() {
                    return Err(EncodeError::Task("encoder call abandoned".to_string()));
                }
            }
            result
        })
    }
}

/// A save the saver was asked to perform
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFile {
    /// The image that would have been written
    pub image: DataUri,
    /// The requested file name
    pub file_name: String,
}

/// File saver that records saves instead of writing them.
///
/// Reports each file as saved under its bare file name.
#[derive(Clone, Default)]
pub struct RecordingFileSaver {
    saves: Arc<Mutex<Vec<SavedFile>>>,
    failure: Arc<Mutex<Option<SaveError>>>,
}

impl RecordingFileSaver {
    /// Saver that accepts every save
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail with `error`
    pub fn fail_with(&self, error: SaveError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// All saves so far
    #[must_use]
    pub fn saves(&self) -> Vec<SavedFile> {
        self.saves.lock().unwrap().clone()
    }

    /// Whether nothing has been saved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saves.lock().unwrap().is_empty()
    }
}

impl FileSaver for RecordingFileSaver {
    fn save(
        &self,
        image: DataUri,
        file_name: String,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf, SaveError>> + Send + '_>> {
        let failure = self.failure.lock().unwrap().clone();
        Box::pin(async move {
            if let Some(error) = failure {
                return Err(error);
            }
            let path = PathBuf::from(&file_name);
            self.saves.lock().unwrap().push(SavedFile { image, file_name });
            Ok(path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_results_are_used_in_order() {
        let encoder = MockCodeEncoder::new();
        encoder.fail_next(EncodeError::Render("boom".to_string()));

        let first = encoder.encode("a".to_string()).await;
        let second = encoder.encode("b".to_string()).await;

        assert_eq!(first, Err(EncodeError::Render("boom".to_string())));
        assert_eq!(second, Ok(MockCodeEncoder::image_for("b")));
        assert_eq!(encoder.payloads(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn gated_calls_complete_in_release_order() {
        let encoder = MockCodeEncoder::gated();
        let first = tokio::spawn({
            let encoder = encoder.clone();
            async move { encoder.encode("first".to_string()).await }
        });
        encoder.wait_for_calls(1).await;
        let second = tokio::spawn({
            let encoder = encoder.clone();
            async move { encoder.encode("second".to_string()).await }
        });
        encoder.wait_for_calls(2).await;

        assert!(encoder.release(1));
        assert_eq!(
            second.await.unwrap(),
            Ok(MockCodeEncoder::image_for("second"))
        );
        assert!(!first.is_finished());

        assert!(encoder.release(0));
        assert_eq!(first.await.unwrap(), Ok(MockCodeEncoder::image_for("first")));
        assert!(!encoder.release(0));
    }

    #[tokio::test]
    async fn recording_saver_records_and_fails_on_demand() {
        let saver = RecordingFileSaver::new();
        let path = saver
            .save(DataUri::png(b"x"), "qr_code.png".to_string())
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("qr_code.png"));
        assert_eq!(saver.saves().len(), 1);

        saver.fail_with(SaveError::Io("disk full".to_string()));
        let result = saver.save(DataUri::png(b"y"), "qr_code.png".to_string()).await;
        assert_eq!(result, Err(SaveError::Io("disk full".to_string())));
        assert_eq!(saver.saves().len(), 1);
    }
}
