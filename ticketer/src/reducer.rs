//! Reducer logic for the ticket form.
//!
//! The reducer is the single writer of [`TicketFormState`]. Editing and
//! validating are synchronous; rendering the code and saving it are the only
//! effects, and their results come back as actions.
//!
//! Overlapping generate requests are tagged with a [`RequestId`]. Under
//! [`CompletionPolicy::LatestRequest`] a result for anything but the most
//! recently issued request is dropped; under
//! [`CompletionPolicy::LastCompletion`] the last result to arrive wins.

use crate::config::{CompletionPolicy, FormSettings};
use crate::payload::{ambiguous_segments, ticket_link};
use crate::types::{
    DownloadOutcome, Field, FieldErrors, FieldValue, GeneratedCode, RegistrationForm, RequestId,
};
use crate::validation::FormRules;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketer_core::environment::{Clock, CodeEncoder, FileSaver};
use ticketer_core::error::EncodeError;
use ticketer_core::{DataUri, SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};

/// State of one form instance
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFormState {
    /// Current field values
    pub form: RegistrationForm,
    /// Messages from the most recent validation pass
    pub errors: FieldErrors,
    /// Whether a code has been shown. Never goes back to `false`.
    pub code_visible: bool,
    /// The code on display
    pub code: Option<GeneratedCode>,
    /// Most recently issued generate request
    pub latest_request: RequestId,
    /// Generate requests still waiting for the encoder
    pub in_flight: usize,
    /// Why the last applicable generate request failed
    pub encode_error: Option<String>,
    /// Result of the most recent download
    pub last_download: Option<DownloadOutcome>,
}

impl TicketFormState {
    /// Re-validate the whole form, replacing the stored errors.
    ///
    /// Returns `true` if every field passed.
    pub fn validate(&mut self, rules: &FormRules) -> bool {
        self.errors = rules.validate(&self.form);
        self.errors.is_empty()
    }

    /// The image on display, if any
    #[must_use]
    pub fn code_image(&self) -> Option<&DataUri> {
        self.code.as_ref().map(|code| &code.image)
    }

    /// Whether the download action would do anything
    #[must_use]
    pub const fn can_download(&self) -> bool {
        self.code.is_some()
    }

    fn is_stale(&self, request: RequestId, policy: CompletionPolicy) -> bool {
        match policy {
            CompletionPolicy::LatestRequest => request != self.latest_request,
            CompletionPolicy::LastCompletion => false,
        }
    }
}

/// Inputs to the ticket form
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketFormAction {
    /// The user changed a field
    UpdateField {
        /// Which field
        field: Field,
        /// Its new raw value
        value: FieldValue,
    },

    /// Validate the form without generating anything
    Validate,

    /// Validate, then render a code for the ticket link
    GenerateCode,

    /// The encoder finished a request
    CodeGenerated {
        /// Request the result belongs to
        request: RequestId,
        /// Text that was encoded
        payload: String,
        /// Rendered image
        image: DataUri,
    },

    /// The encoder gave up on a request
    CodeFailed {
        /// Request the failure belongs to
        request: RequestId,
        /// What went wrong
        error: EncodeError,
    },

    /// Save the displayed code
    DownloadCode,

    /// The file saver finished
    DownloadFinished {
        /// What happened
        outcome: DownloadOutcome,
    },
}

impl TicketFormAction {
    /// `UpdateField` with a text value
    #[must_use]
    pub fn update_text(field: Field, value: impl Into<String>) -> Self {
        Self::UpdateField {
            field,
            value: FieldValue::Text(value.into()),
        }
    }

    /// Whether this action reports the end of a generate request
    #[must_use]
    pub const fn is_generation_result(&self) -> bool {
        matches!(self, Self::CodeGenerated { .. } | Self::CodeFailed { .. })
    }
}

/// Environment dependencies for the ticket form reducer
#[derive(Clone)]
pub struct TicketFormEnvironment {
    /// Renders payloads into images
    pub encoder: Arc<dyn CodeEncoder>,
    /// Saves downloaded images
    pub saver: Arc<dyn FileSaver>,
    /// Stamps generated codes
    pub clock: Arc<dyn Clock>,
    /// Rules, link prefix and policies
    pub settings: Arc<FormSettings>,
}

impl TicketFormEnvironment {
    /// Creates a new `TicketFormEnvironment`
    #[must_use]
    pub fn new(
        encoder: Arc<dyn CodeEncoder>,
        saver: Arc<dyn FileSaver>,
        clock: Arc<dyn Clock>,
        settings: FormSettings,
    ) -> Self {
        Self {
            encoder,
            saver,
            clock,
            settings: Arc::new(settings),
        }
    }
}

/// Reducer for the ticket form
#[derive(Clone, Debug, Default)]
pub struct TicketFormReducer;

impl TicketFormReducer {
    /// Creates a new `TicketFormReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn generate(
        state: &mut TicketFormState,
        env: &TicketFormEnvironment,
    ) -> SmallVec<[Effect<TicketFormAction>; 4]> {
        let rules = &env.settings.rules;
        if !state.validate(rules) {
            tracing::info!(
                invalid_fields = ?state.errors.fields().collect::<Vec<_>>(),
                "Form is incomplete, not generating a code"
            );
            return SmallVec::new();
        }

        let Some(roll_number) = rules.accepted_roll_number(&state.form.roll_number) else {
            tracing::error!(
                roll_number = %state.form.roll_number,
                "Validated roll number did not coerce, not generating a code"
            );
            return SmallVec::new();
        };

        let payload = ticket_link(
            &env.settings.base_url,
            &state.form.first_name,
            &state.form.email,
            roll_number,
        );
        let ambiguous = ambiguous_segments(&state.form.first_name, &state.form.email);
        if !ambiguous.is_empty() {
            tracing::warn!(
                fields = ?ambiguous,
                "Ticket link contains '/' inside a value and will not parse back cleanly"
            );
        }

        let request = state.latest_request.next();
        state.latest_request = request;
        state.in_flight += 1;
        state.encode_error = None;
        tracing::debug!(%request, "Requesting code");

        let encoder = Arc::clone(&env.encoder);
        smallvec![async_effect! {
            match encoder.encode(payload.clone()).await {
                Ok(image) => Some(TicketFormAction::CodeGenerated { request, payload, image }),
                Err(error) => Some(TicketFormAction::CodeFailed { request, error }),
            }
        }]
    }

    fn download(
        state: &TicketFormState,
        env: &TicketFormEnvironment,
    ) -> SmallVec<[Effect<TicketFormAction>; 4]> {
        let Some(image) = state.code_image().cloned() else {
            tracing::debug!("No code to download");
            return SmallVec::new();
        };

        let saver = Arc::clone(&env.saver);
        let file_name = env.settings.download_file_name.clone();
        smallvec![async_effect! {
            let outcome = match saver.save(image, file_name).await {
                Ok(path) => DownloadOutcome::Saved { path },
                Err(error) => DownloadOutcome::Failed { message: error.to_string() },
            };
            Some(TicketFormAction::DownloadFinished { outcome })
        }]
    }
}

impl Reducer for TicketFormReducer {
    type State = TicketFormState;
    type Action = TicketFormAction;
    type Environment = TicketFormEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TicketFormAction::UpdateField { field, value } => {
                if let Err(error) = state.form.update(field, value) {
                    tracing::warn!(%error, "Ignoring field update");
                }
                SmallVec::new()
            },

            TicketFormAction::Validate => {
                let valid = state.validate(&env.settings.rules);
                tracing::debug!(valid, errors = state.errors.len(), "Validated form");
                SmallVec::new()
            },

            TicketFormAction::GenerateCode => Self::generate(state, env),

            TicketFormAction::CodeGenerated {
                request,
                payload,
                image,
            } => {
                state.in_flight = state.in_flight.saturating_sub(1);
                if state.is_stale(request, env.settings.completion_policy) {
                    tracing::debug!(%request, latest = %state.latest_request, "Dropping stale code");
                    return SmallVec::new();
                }

                tracing::info!(%request, "Code generated");
                state.code = Some(GeneratedCode {
                    request,
                    payload,
                    image,
                    generated_at: env.clock.now(),
                });
                state.code_visible = true;
                state.encode_error = None;
                SmallVec::new()
            },

            TicketFormAction::CodeFailed { request, error } => {
                state.in_flight = state.in_flight.saturating_sub(1);
                if state.is_stale(request, env.settings.completion_policy) {
                    tracing::debug!(%request, %error, "Dropping stale encode failure");
                    return SmallVec::new();
                }

                tracing::warn!(%request, %error, "Code generation failed");
                state.encode_error = Some(format!("Could not generate QR code: {error}"));
                SmallVec::new()
            },

            TicketFormAction::DownloadCode => Self::download(state, env),

            TicketFormAction::DownloadFinished { outcome } => {
                match &outcome {
                    DownloadOutcome::Saved { path } => {
                        tracing::info!(path = %path.display(), "Code saved");
                    },
                    DownloadOutcome::Failed { message } => {
                        tracing::warn!(%message, "Code could not be saved");
                    },
                }
                state.last_download = Some(outcome);
                SmallVec::new()
            },
        }
    }
}
