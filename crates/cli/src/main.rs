mod devices;

use ambu_client::{ClientConfig, JournalClient};
use ambu_core::assistant::{CaseAnalysis, CaseAssistant, MockAssistant};
use ambu_core::capture::{brief_script, CameraSession, CapturedImage, ImageStore, SpeechOutput};
use ambu_core::config::{dir_from_env_value, max_matches_from_env_value, search_threshold_from_env_value};
use ambu_core::constants::{DEFAULT_EMERGENCY_LOGS_DIR, DEFAULT_JOURNALS_DIR, DEFAULT_PATIENT_IMAGES_DIR};
use ambu_core::label::display_name;
use ambu_core::session::CaseSession;
use ambu_core::{
    resolve, search, CoreConfig, JournalSource, LocalJournals, PatientDirectory, PatientRecord,
    PatientSelector, SearchOutcome, Selection, SelectionOutcome,
};
use clap::{Parser, Subcommand};
use devices::{ConsoleSpeech, FileCamera};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ambu")]
#[command(about = "Ambulance Assistant point-of-care CLI")]
struct Cli {
    /// Read journals from the local data directories instead of the journal API
    #[arg(long, global = true)]
    local: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a search label into name, birth date and identifier
    Resolve {
        /// Label such as "Ola Hansen - 120384 12345"
        label: String,
    },
    /// Search patients by name, birth date or personal number
    Search {
        query: String,
    },
    /// Select a patient and print the emergency brief
    Select {
        label: String,
        /// Read the brief aloud
        #[arg(long)]
        speak: bool,
    },
    /// List the journals in the local index
    Journals,
    /// Run a case assessment from a photo
    Assess {
        label: String,
        /// Path of the patient photo
        #[arg(long)]
        image: PathBuf,
        /// Additional observations
        #[arg(long, default_value = "")]
        notes: String,
        /// Keep a copy of the photo in the patient images directory
        #[arg(long)]
        save: bool,
        /// Follow-up question for the assistant once the analysis is ready (repeatable)
        #[arg(long = "ask")]
        questions: Vec<String>,
    },
    /// Ask the assistant a question
    Chat {
        message: String,
        /// Patient whose journal the question is about
        #[arg(long)]
        label: Option<String>,
    },
}

/// Where patient data comes from.
enum Backend {
    Local(Arc<LocalJournals>),
    Remote(Arc<JournalClient>),
}

impl Backend {
    fn directory(&self) -> &dyn PatientDirectory {
        match self {
            Backend::Local(journals) => journals.as_ref(),
            Backend::Remote(client) => client.as_ref(),
        }
    }

    fn source(&self) -> Arc<dyn JournalSource> {
        match self {
            Backend::Local(journals) => journals.clone(),
            Backend::Remote(client) => client.clone(),
        }
    }

    /// Journal text of the selected patient, as the assistant sees it.
    fn journal_text(record: &PatientRecord) -> Option<&str> {
        record
            .journal_entries()
            .first()
            .map(|entry| entry.description.as_str())
            .filter(|text| !text.trim().is_empty())
    }

    async fn analyze(
        &self,
        session: &CaseSession,
        photo: &CapturedImage,
    ) -> anyhow::Result<CaseAnalysis> {
        let Some(record) = session.record() else {
            anyhow::bail!("no patient selected");
        };
        match self {
            Backend::Local(_) => Ok(MockAssistant::new()
                .analyze_case(record.id(), photo, session.notes())
                .await?),
            Backend::Remote(client) => {
                let result = client
                    .analyze_image(record.id(), photo, session.notes(), Self::journal_text(record))
                    .await?;
                println!("Photo stored by the journal service as {}", result.filename);
                if let Some(info) = &result.relevant_info {
                    println!("Relevant journal information:");
                    for line in info.lines() {
                        println!("  {line}");
                    }
                }
                Ok(result.analysis)
            }
        }
    }

    async fn ask(&self, record: Option<&PatientRecord>, question: &str) -> anyhow::Result<String> {
        match (self, record.and_then(Self::journal_text)) {
            (Backend::Remote(client), Some(text)) => Ok(client.ask_question(question, text).await?),
            _ => Ok(MockAssistant::new().chat(question).await?),
        }
    }
}

fn core_config_from_env() -> anyhow::Result<CoreConfig> {
    let env = |key: &str| std::env::var(key).ok();
    Ok(CoreConfig::new(
        dir_from_env_value(env("JOURNALS_DIR"), DEFAULT_JOURNALS_DIR),
        dir_from_env_value(env("EMERGENCY_LOGS_DIR"), DEFAULT_EMERGENCY_LOGS_DIR),
        dir_from_env_value(env("PATIENT_IMAGES_DIR"), DEFAULT_PATIENT_IMAGES_DIR),
        search_threshold_from_env_value(env("SEARCH_THRESHOLD"))?,
        max_matches_from_env_value(env("SEARCH_MAX_MATCHES"))?,
    )?)
}

fn backend(local: bool, cfg: &CoreConfig) -> anyhow::Result<Backend> {
    if local {
        return Ok(Backend::Local(Arc::new(LocalJournals::load(cfg)?)));
    }
    let client_cfg = ClientConfig::from_env_values(
        std::env::var("AMBU_API_BASE_URL").ok(),
        std::env::var("AMBU_REQUEST_TIMEOUT_SECS").ok(),
    )?;
    Ok(Backend::Remote(Arc::new(JournalClient::new(client_cfg)?)))
}

async fn select(backend: &Backend, label: &str) -> anyhow::Result<Selection> {
    let selector = PatientSelector::new(backend.source());
    match selector.select(label).await {
        SelectionOutcome::Selected(selection) => Ok(*selection),
        SelectionOutcome::Superseded(_) => anyhow::bail!("selection was superseded"),
    }
}

fn print_selection(selection: &Selection) {
    let record = &selection.record;
    println!("Name: {}", record.name());
    println!("Date of birth: {}", record.date_of_birth());
    println!("Patient ID: {}", record.id());
    for degradation in &selection.degradations {
        println!("  note: {degradation}");
    }
    if let Some(failure) = &selection.journal_failure {
        tracing::warn!(patient_id = record.id(), %failure, "journal fetch failed");
        eprintln!("{} ({failure})", failure.user_message());
    }
    if let Some(failure) = &selection.emergency_log_failure {
        tracing::warn!(patient_id = record.id(), %failure, "emergency log fetch failed");
        eprintln!("Could not load emergency calls ({failure})");
    }
}

fn print_brief(record: &PatientRecord) {
    let brief = record.brief();
    println!();
    println!("Recent Emergency Calls");
    match brief.latest_emergency {
        Some(log) => {
            println!(
                "  {} [{}] {} (caller: {})",
                log.date.format("%Y-%m-%d %H:%M"),
                log.urgency_level,
                log.description,
                log.caller
            );
            if let Some(notes) = &log.dispatch_notes {
                println!("  dispatch: {notes}");
            }
        }
        None => println!("  none"),
    }

    println!();
    println!("Journal Summary");
    if brief.recent_entries.is_empty() {
        println!("  none");
    }
    for entry in brief.recent_entries {
        println!("{}", entry.summary.as_deref().unwrap_or(&entry.description));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ambu=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = core_config_from_env()?;

    match cli.command {
        Some(Commands::Resolve { label }) => {
            let resolved = resolve(&label);
            println!("Name: {}", resolved.name);
            println!("Date of birth: {}", resolved.date_of_birth);
            println!("Personal number: {}", resolved.personal_number);
            println!("Identifier: {}", resolved.identifier);
            for degradation in &resolved.degradations {
                println!("  note: {degradation}");
            }
        }
        Some(Commands::Search { query }) => {
            let backend = backend(cli.local, &cfg)?;
            match search(backend.directory(), &query).await {
                Ok(SearchOutcome::EmptyQuery) => println!("Please enter a search term."),
                Ok(SearchOutcome::NoMatches) => println!("No matching patients found."),
                Ok(SearchOutcome::Matches(hits)) => {
                    for hit in hits {
                        println!("{:<24} {:>4}  {}", display_name(&hit.label), hit.score, hit.label);
                    }
                }
                Err(failure) => eprintln!("Error searching patients: {failure}"),
            }
        }
        Some(Commands::Select { label, speak }) => {
            let backend = backend(cli.local, &cfg)?;
            let selection = select(&backend, &label).await?;
            print_selection(&selection);
            print_brief(&selection.record);
            if speak {
                let mut speech = ConsoleSpeech::default();
                speech.toggle(&brief_script(&selection.record));
            }
        }
        Some(Commands::Journals) => {
            let journals = LocalJournals::load(&cfg)?;
            if journals.index().is_empty() {
                println!("No journals found.");
            } else {
                for label in journals.index().labels() {
                    println!("{label}");
                }
            }
        }
        Some(Commands::Assess {
            label,
            image,
            notes,
            save,
            questions,
        }) => {
            let backend = backend(cli.local, &cfg)?;
            let selection = select(&backend, &label).await?;
            print_selection(&selection);

            let mut session = CaseSession::new();
            session.select_patient(selection.record)?;
            session.continue_to_assessment()?;
            session.set_notes(notes)?;

            let mut camera = FileCamera::new(image);
            let photo = CameraSession::open(&mut camera)?.capture()?;
            if save {
                let path = ImageStore::new(cfg.patient_images_dir()).save(&photo)?;
                println!("Saved photo to {}", path.display());
            }
            session.add_image(photo.clone())?;

            println!("Analyzing...");
            let analysis = backend.analyze(&session, &photo).await?;
            session.complete_analysis(analysis)?;

            if let Some(analysis) = session.analysis() {
                println!();
                println!("Risk level: {:?}", analysis.risk_level);
                println!("{}", analysis.summary);
                println!();
                println!("Action points");
                for point in &analysis.action_points {
                    println!("  [{:?}] {}", point.priority, point.description);
                }
                println!();
                println!("Recommendations");
                for recommendation in &analysis.recommendations {
                    println!("  - {recommendation}");
                }
            }

            for question in questions {
                session.push_user_message(&question)?;
                println!();
                println!("> {question}");
                let reply = backend.ask(session.record(), &question).await;
                match reply {
                    Ok(reply) => println!("{}", session.push_assistant_message(reply)?.content),
                    Err(e) => {
                        tracing::warn!("assistant reply failed: {e:#}");
                        session.fail_pending_reply()?;
                        eprintln!("Sorry, I encountered an error. Please try again.");
                    }
                }
            }
        }
        Some(Commands::Chat { message, label }) => {
            if message.trim().is_empty() {
                anyhow::bail!("message is empty");
            }
            let reply = match (label, cli.local) {
                (Some(label), false) => {
                    let client_cfg = ClientConfig::from_env_values(
                        std::env::var("AMBU_API_BASE_URL").ok(),
                        std::env::var("AMBU_REQUEST_TIMEOUT_SECS").ok(),
                    )?;
                    let client = JournalClient::new(client_cfg)?;
                    let journal = client.journal(&label).await?;
                    client.ask_question(&message, &journal.text).await?
                }
                _ => MockAssistant::new().chat(&message).await?,
            };
            println!("{reply}");
        }
        None => {
            println!("Use 'ambu --help' for commands");
        }
    }

    Ok(())
}
