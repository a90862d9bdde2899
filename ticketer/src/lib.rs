//! Attendee registration form that issues QR-coded ticket links.
//!
//! The form collects a first name, last name, email, roll number, gender and
//! an optional image. Generating a code validates every field; when all pass,
//! the ticket link `{base_url}/{first_name}/{email}/{roll_number}` is rendered
//! as a QR code PNG and kept as a `data:` URI until it is downloaded.
//!
//! All form logic lives in [`TicketFormReducer`]. Rendering and saving are
//! effects executed by the store and reported back as actions.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticketer::{
//!     DirectoryFileSaver, Field, FormSettings, QrCodeEncoder, TicketFormAction,
//!     TicketFormEnvironment, TicketFormReducer, TicketFormState,
//! };
//! use ticketer_core::environment::SystemClock;
//! use ticketer_runtime::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TicketFormEnvironment::new(
//!     Arc::new(QrCodeEncoder::default()),
//!     Arc::new(DirectoryFileSaver::new(".")),
//!     Arc::new(SystemClock),
//!     FormSettings::default(),
//! );
//! let store = Store::new(TicketFormState::default(), TicketFormReducer::new(), env);
//!
//! store.send(TicketFormAction::update_text(Field::FirstName, "Ada")).await?;
//! // ... remaining fields ...
//! let mut handle = store.send(TicketFormAction::GenerateCode).await?;
//! handle.wait().await;
//!
//! let visible = store.state(|s| s.code_visible).await;
//! println!("code visible: {visible}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod payload;
pub mod qr;
pub mod reducer;
pub mod saver;
pub mod terminal;
pub mod types;
pub mod validation;

pub use config::{CompletionPolicy, Config, FormSettings};
pub use qr::QrCodeEncoder;
pub use reducer::{TicketFormAction, TicketFormEnvironment, TicketFormReducer, TicketFormState};
pub use saver::DirectoryFileSaver;
pub use types::{
    DownloadOutcome, Field, FieldErrors, FieldValue, Gender, GeneratedCode, ImageAttachment,
    RegistrationForm, RequestId,
};
pub use validation::FormRules;
