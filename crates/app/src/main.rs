use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use resume_screen_core::{
    expand_inputs, media_type_for, CandidateProfile, Document, EventSink, FilterSpec,
    GeminiBackend, GeminiConfig, JobDescription, PipelineEvent, PipelineOptions, RetryPolicy,
    Session, ARCHIVE_EXTENSION, DOCUMENT_EXTENSIONS,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "resume-screen", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract candidate profiles, optionally score them against a job, and print them.
    Screen(ScreenArgs),
    /// List the documents that would be analyzed, without calling the model.
    Expand {
        /// Resume files, zip archives or folders (searched recursively).
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct ScreenArgs {
    /// Resume files, zip archives or folders (searched recursively).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Job description to score candidates against.
    #[arg(long, conflicts_with = "job_file")]
    job: Option<String>,

    /// File holding the job description.
    #[arg(long)]
    job_file: Option<PathBuf>,

    /// Keep candidates whose applied-for position contains this text.
    #[arg(long, default_value = "")]
    filter_job: String,

    /// Keep candidates whose governorate contains this text.
    #[arg(long, default_value = "")]
    governorate: String,

    /// Age filter: exact ("30") or inclusive range ("25-35", "30-").
    #[arg(long, default_value = "")]
    age: String,

    /// Print the result set as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct ModelArgs {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model identifier
    #[arg(long, env = "GEMINI_MODEL", default_value = resume_screen_core::config::DEFAULT_GEMINI_MODEL)]
    model: String,

    /// Generative Language API base URL
    #[arg(long, env = "GEMINI_ENDPOINT", default_value = resume_screen_core::config::DEFAULT_GEMINI_ENDPOINT)]
    endpoint: String,

    /// Delay between consecutive model calls, in milliseconds.
    #[arg(long, default_value = "1000")]
    pacing_ms: u64,

    /// Attempts per call when the model is rate limited.
    #[arg(long, default_value = "4")]
    max_attempts: u32,
}

impl ModelArgs {
    fn gemini_config(&self) -> anyhow::Result<GeminiConfig> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("an API key is required (--api-key or GEMINI_API_KEY)"))?;

        Ok(GeminiConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key: api_key.to_string(),
        })
    }

    fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            retry: RetryPolicy {
                max_attempts: self.max_attempts.max(1),
                ..RetryPolicy::default()
            },
            pacing_delay: Duration::from_millis(self.pacing_ms),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "resume-screen boot"
    );

    match cli.command {
        Command::Expand { inputs } => {
            let documents = prepare_documents(&inputs).await?;

            for document in &documents {
                println!("{}\t{}\t{} bytes", document.name, document.media_type, document.size());
            }
            println!("{} document(s) ready for analysis", documents.len());
        }
        Command::Screen(args) => screen(args).await?,
    }

    Ok(())
}

async fn screen(args: ScreenArgs) -> anyhow::Result<()> {
    let job = match (&args.job, &args.job_file) {
        (Some(text), _) => Some(JobDescription::new(text.clone())?),
        (None, Some(path)) => Some(JobDescription::new(tokio::fs::read_to_string(path).await?)?),
        (None, None) => None,
    };

    let backend = GeminiBackend::new(args.model.gemini_config()?)?;
    let session = Session::new(backend, args.model.pipeline_options());
    let files = load_inputs(&args.inputs).await?;

    let (events, receiver) = EventSink::channel();
    let reporter = tokio::spawn(report_progress(receiver));

    let outcome = async {
        let summary = session.ingest(files, &events).await?;
        println!(
            "{} unique candidate(s) added, {} duplicate(s) skipped",
            summary.unique, summary.duplicates
        );

        if let Some(job) = &job {
            session.score(job, &events).await?;
        }
        Ok::<_, resume_screen_core::PipelineError>(())
    }
    .await;

    drop(events);
    if let Err(error) = reporter.await {
        warn!(error = %error, "progress reporter stopped unexpectedly");
    }
    outcome.context("screening failed")?;

    let spec = FilterSpec {
        job: args.filter_job,
        governorate: args.governorate,
        age: args.age,
    };
    let profiles = session.filter(&spec).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
    } else {
        print_profiles(&profiles);
    }

    Ok(())
}

async fn report_progress(mut receiver: UnboundedReceiver<PipelineEvent>) {
    while let Some(event) = receiver.recv().await {
        match event {
            PipelineEvent::Progress {
                phase,
                current,
                total,
            } => eprintln!("[{phase:?}] processing {current} of {total}"),
            PipelineEvent::ProfileAdded(profile) => {
                eprintln!("  added {} ({})", profile.display_name(), profile.source_document.name)
            }
            PipelineEvent::DuplicateSkipped { document } => {
                eprintln!("  skipped duplicate candidate in {document}")
            }
            PipelineEvent::ScoreUpdated { score, .. } => eprintln!("  scored {score}%"),
            PipelineEvent::Failed { message } => eprintln!("error: {message}"),
            PipelineEvent::IngestionCompleted(_) | PipelineEvent::MatchCompleted(_) => {}
        }
    }
}

fn print_profiles(profiles: &[CandidateProfile]) {
    if profiles.is_empty() {
        println!("no candidates match the filter");
        return;
    }

    for (rank, profile) in profiles.iter().enumerate() {
        let score = profile
            .match_score
            .map(|score| format!("{score}%"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}. {} score={} email={} phone={} age={} governorate={} applied_for={}",
            rank + 1,
            profile.display_name(),
            score,
            profile.email.as_deref().unwrap_or("-"),
            profile.phone.as_deref().unwrap_or("-"),
            profile
                .age
                .map(|age| age.to_string())
                .unwrap_or_else(|| "-".to_string()),
            profile.governorate.as_deref().unwrap_or("-"),
            profile.applied_for.as_deref().unwrap_or("-"),
        );
        println!("   skills: {}", profile.skills_list());
        println!("   experience: {}", profile.experience_summary);
        println!("   source: {}", profile.source_document.name);
    }
}

/// Expands folders into their archive and document files, keeping the order the
/// paths were given in and sorting within each folder.
fn discover_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).into_iter().filter_map(|item| item.ok()) {
            if entry.file_type().is_file() && is_accepted(entry.path()) {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort_unstable();
        files.extend(found);
    }

    files
}

fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| ext == ARCHIVE_EXTENSION || DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
}

async fn prepare_documents(inputs: &[PathBuf]) -> anyhow::Result<Vec<Document>> {
    let files = load_inputs(inputs).await?;
    expand_inputs(files).await.context("failed to expand inputs")
}

async fn load_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::new();

    for path in discover_input_files(inputs) {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|error| anyhow::anyhow!("cannot read {}: {error}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("path has no file name: {}", path.display()))?
            .to_string();
        let media_type = media_type_for(&name);
        documents.push(Document::new(name, media_type, bytes));
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::{discover_input_files, load_inputs, prepare_documents};
    use resume_screen_core::PipelineError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn folders_are_walked_recursively_for_accepted_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        fs::write(base.join("b.pdf"), b"%PDF")?;
        fs::write(base.join("a.ZIP"), b"PK")?;
        fs::write(base.join("notes.txt"), b"skip")?;
        fs::write(nested.join("c.docx"), b"docx")?;

        let files = discover_input_files(&[base.to_path_buf()]);
        let names: Vec<_> = files
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();

        assert_eq!(names, vec!["a.ZIP", "b.pdf", "c.docx"]);
        Ok(())
    }

    #[test]
    fn explicit_files_keep_their_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let second = dir.path().join("z.pdf");
        let first = dir.path().join("a.pdf");
        fs::write(&second, b"z")?;
        fs::write(&first, b"a")?;

        let files = discover_input_files(&[second.clone(), first.clone()]);

        assert_eq!(files, vec![second, first]);
        Ok(())
    }

    #[tokio::test]
    async fn loaded_inputs_carry_name_and_media_type() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("cv.xlsx");
        fs::write(&path, b"sheet")?;

        let documents = load_inputs(&[path]).await?;

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].name, "cv.xlsx");
        assert_eq!(
            documents[0].media_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(&*documents[0].bytes, b"sheet");
        Ok(())
    }

    #[tokio::test]
    async fn archive_failures_keep_their_cause() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.zip");
        fs::write(&path, b"not a zip")?;

        let error = prepare_documents(&[path]).await.expect_err("archive is corrupt");

        assert!(matches!(
            error.downcast_ref::<PipelineError>(),
            Some(PipelineError::Archive { .. })
        ));
        assert!(error.chain().count() >= 3);
        Ok(())
    }
}
