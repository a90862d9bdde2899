//! Ticket registration from the command line.
//!
//! Fills the form from flags (or prompts), generates the QR code and
//! optionally saves it.

use anyhow::Context;
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use ticketer::config::{Config, DEFAULT_LOG_FILTER};
use ticketer::terminal::{prompt_form, render_form};
use ticketer::{
    DirectoryFileSaver, DownloadOutcome, Field, FieldValue, ImageAttachment, QrCodeEncoder,
    TicketFormAction, TicketFormEnvironment, TicketFormReducer, TicketFormState, qr,
};
use ticketer_core::environment::SystemClock;
use ticketer_runtime::Store;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type TicketStore = Store<TicketFormState, TicketFormAction, TicketFormEnvironment, TicketFormReducer>;

#[derive(Parser, Debug)]
#[command(name = "ticketer")]
#[command(about = "Register an attendee and issue a QR-coded ticket link")]
#[command(version)]
struct Args {
    /// Attendee's first name
    #[arg(long)]
    first_name: Option<String>,

    /// Attendee's last name
    #[arg(long)]
    last_name: Option<String>,

    /// Contact email
    #[arg(long)]
    email: Option<String>,

    /// Roll number
    #[arg(long)]
    roll_number: Option<String>,

    /// Gender (male, female or other)
    #[arg(long)]
    gender: Option<String>,

    /// Optional photo to attach
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Prompt for each field on stdin
    #[arg(short, long)]
    interactive: bool,

    /// Save the generated code as a PNG
    #[arg(short, long)]
    download: bool,

    /// Print the generated code as a data URI
    #[arg(long)]
    data_uri: bool,
}

impl Args {
    fn text_fields(&self) -> Vec<(Field, String)> {
        [
            (Field::FirstName, &self.first_name),
            (Field::LastName, &self.last_name),
            (Field::Email, &self.email),
            (Field::RollNumber, &self.roll_number),
            (Field::Gender, &self.gender),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.clone().map(|value| (field, value)))
        .collect()
    }
}

async fn load_image(path: &Path) -> anyhow::Result<ImageAttachment> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(ImageAttachment::new(file_name, bytes))
}

async fn fill_form(store: &TicketStore, args: &Args) -> anyhow::Result<()> {
    let mut updates = args.text_fields();
    if args.interactive {
        let answers = prompt_form(io::stdin().lock(), io::stdout())?;
        updates.extend(answers);
    }

    for (field, value) in updates {
        store
            .send(TicketFormAction::update_text(field, value))
            .await?;
    }

    if let Some(path) = &args.image {
        let image = load_image(path).await?;
        store
            .send(TicketFormAction::UpdateField {
                field: Field::Image,
                value: FieldValue::File(Some(image)),
            })
            .await?;
    }
    Ok(())
}

async fn run(store: &TicketStore, args: &Args, config: &Config) -> anyhow::Result<ExitCode> {
    fill_form(store, args).await?;

    store.send(TicketFormAction::Validate).await?;
    let state = store.state(TicketFormState::clone).await;
    if !state.errors.is_empty() {
        eprint!("{}", render_form(&state.form, &state.errors));
        return Ok(ExitCode::FAILURE);
    }

    store
        .send_and_wait_for(
            TicketFormAction::GenerateCode,
            TicketFormAction::is_generation_result,
            config.cli.encode_timeout(),
        )
        .await
        .context("timed out waiting for the QR code")?;

    let state = store.state(TicketFormState::clone).await;
    if let Some(message) = &state.encode_error {
        eprintln!("{message}");
        return Ok(ExitCode::FAILURE);
    }
    let Some(code) = &state.code else {
        eprintln!("No QR code was generated");
        return Ok(ExitCode::FAILURE);
    };

    println!("{}", qr::render_terminal(&code.payload)?);
    println!("{}", code.payload);
    if args.data_uri {
        println!("{}", code.image);
    }

    if args.download {
        let finished = store
            .send_and_wait_for(
                TicketFormAction::DownloadCode,
                |action| matches!(action, TicketFormAction::DownloadFinished { .. }),
                config.cli.encode_timeout(),
            )
            .await
            .context("timed out saving the QR code")?;

        if let TicketFormAction::DownloadFinished { outcome } = finished {
            match outcome {
                DownloadOutcome::Saved { path } => println!("Saved {}", path.display()),
                DownloadOutcome::Failed { message } => {
                    eprintln!("Could not save QR code: {message}");
                    return Ok(ExitCode::FAILURE);
                },
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.cli.log_level)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!(
        base_url = %config.form.base_url,
        completion_policy = %config.form.completion_policy,
        download_dir = %config.cli.download_dir.display(),
        "Configuration loaded"
    );

    let env = TicketFormEnvironment::new(
        Arc::new(QrCodeEncoder::new(config.qr.scale)),
        Arc::new(DirectoryFileSaver::new(config.cli.download_dir.clone())),
        Arc::new(SystemClock),
        config.form.clone(),
    );
    let store = Store::new(TicketFormState::default(), TicketFormReducer::new(), env);

    let result = run(&store, &args, &config).await;

    if let Err(error) = store.shutdown(Duration::from_secs(1)).await {
        tracing::warn!(%error, "Store did not shut down cleanly");
    }
    result
}
