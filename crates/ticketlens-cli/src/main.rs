//! ticketlens: annotate support-ticket questions with AWS Comprehend and
//! write the results as CSV.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ticketlens_annotate::{Limits, Mode, Pipeline};
use ticketlens_comprehend::{ClientConfig, ComprehendClient};
use ticketlens_core::{MAX_BATCH_SIZE, MAX_TEXT_BYTES};
use ticketlens_store::{FsBackend, RowWriter, read_questions};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ticketlens", version, about = "Annotate support-ticket questions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract named entities, one column per entity type.
    DetectEntities(RunArgs),
    /// Detect the dominant language of each question.
    DetectLanguages(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// CSV of questions: id, queue name, ticket source, subject, text.
    #[arg(value_name = "QUESTIONS")]
    questions_file: PathBuf,

    /// File to write output (will be overwritten).
    #[arg(value_name = "OUT")]
    out_file: PathBuf,

    /// Directory caching remote results by batch content.
    #[arg(long, env = "TICKETLENS_CACHE_DIR", value_name = "DIR")]
    cache: Option<PathBuf>,

    /// Skip the first row of the questions file.
    #[arg(long, alias = "skipHeader")]
    skip_header: bool,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,

    /// Service endpoint, overriding the regional Comprehend URL.
    #[arg(long, env = "TICKETLENS_ENDPOINT", value_name = "URL")]
    endpoint: Option<String>,

    /// Language of the questions, for entity detection.
    #[arg(long, default_value = "en")]
    language_code: String,

    /// Questions per remote call.
    #[arg(long, default_value_t = MAX_BATCH_SIZE, value_parser = parse_batch_size)]
    batch_size: usize,

    /// Question text is cut to this many UTF-8 bytes before sending.
    #[arg(long, default_value_t = MAX_TEXT_BYTES)]
    max_text_bytes: usize,
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if (1..=MAX_BATCH_SIZE).contains(&n) {
        Ok(n)
    } else {
        Err(format!("must be between 1 and {MAX_BATCH_SIZE}"))
    }
}

impl Command {
    fn into_parts(self) -> (Mode, RunArgs) {
        match self {
            Self::DetectEntities(args) => (Mode::Entities, args),
            Self::DetectLanguages(args) => (Mode::Languages, args),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (mode, args) = Cli::parse().command.into_parts();
    run(mode, args)
}

fn run(mode: Mode, args: RunArgs) -> anyhow::Result<()> {
    info!(mode = mode.spec().name, "ticketlens v{}", env!("CARGO_PKG_VERSION"));

    // Credentials are read from the environment on the first remote call.
    let client = ComprehendClient::new(ClientConfig {
        region: args.region.clone(),
        endpoint: args.endpoint.clone(),
        credentials: None,
    })
    .context("configuring Comprehend client")?;
    info!(url = %client.url(), "using Comprehend endpoint");

    let mut pipeline: Pipeline<ComprehendClient, FsBackend> =
        Pipeline::new(mode, client, &args.language_code)
            .with_limits(Limits {
                batch_size: args.batch_size,
                max_text_bytes: args.max_text_bytes,
            })
            .context("invalid limits")?;
    if let Some(dir) = &args.cache {
        let backend = FsBackend::open(dir)
            .with_context(|| format!("opening cache directory {}", dir.display()))?;
        pipeline = pipeline.with_cache(backend);
    }

    let questions = read_questions(&args.questions_file, args.skip_header)
        .with_context(|| format!("reading {}", args.questions_file.display()))?;
    let mut out = RowWriter::create(&args.out_file)
        .with_context(|| format!("creating {}", args.out_file.display()))?;

    let summary = pipeline
        .run(questions, &mut out)
        .with_context(|| format!("annotating {}", args.questions_file.display()))?;
    out.finish()
        .with_context(|| format!("writing {}", args.out_file.display()))?;

    pipeline.log_summary();
    info!(
        rows = summary.rows_written,
        skipped_empty = summary.skipped_empty,
        truncated = summary.state.truncated,
        out = %args.out_file.display(),
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("ticketlens").chain(args.iter().copied()))
    }

    #[test]
    fn parses_entity_command() {
        let cli = parse(&[
            "detect-entities",
            "questions.csv",
            "out.csv",
            "--cache",
            "/tmp/cache",
            "--skip-header",
        ])
        .unwrap();
        let (mode, args) = cli.command.into_parts();
        assert_eq!(mode, Mode::Entities);
        assert_eq!(args.questions_file, PathBuf::from("questions.csv"));
        assert_eq!(args.out_file, PathBuf::from("out.csv"));
        assert_eq!(args.cache, Some(PathBuf::from("/tmp/cache")));
        assert!(args.skip_header);
        assert_eq!(args.batch_size, MAX_BATCH_SIZE);
        assert_eq!(args.max_text_bytes, MAX_TEXT_BYTES);
        assert_eq!(args.language_code, "en");
    }

    #[test]
    fn parses_language_command_with_legacy_flag() {
        let cli = parse(&["detect-languages", "q.csv", "o.csv", "--skipHeader"]).unwrap();
        let (mode, args) = cli.command.into_parts();
        assert_eq!(mode, Mode::Languages);
        assert!(args.skip_header);
    }

    #[test]
    fn rejects_batch_size_over_service_limit() {
        assert!(parse(&["detect-languages", "q.csv", "o.csv", "--batch-size", "26"]).is_err());
        assert!(parse(&["detect-languages", "q.csv", "o.csv", "--batch-size", "0"]).is_err());
        let cli = parse(&["detect-languages", "q.csv", "o.csv", "--batch-size", "10"]).unwrap();
        assert_eq!(cli.command.into_parts().1.batch_size, 10);
    }

    #[test]
    fn requires_both_files() {
        assert!(parse(&["detect-entities", "q.csv"]).is_err());
        assert!(parse(&["summarize", "q.csv", "o.csv"]).is_err());
    }

    #[test]
    fn fully_cached_run_needs_no_credentials() {
        use ticketlens_store::{CacheBackend, CacheKey};

        let dir = tempfile::tempdir().unwrap();
        let questions = dir.path().join("questions.csv");
        let out = dir.path().join("out.csv");
        let cache = dir.path().join("cache");
        std::fs::write(&questions, "1,billing,email,Hi,hello\n").unwrap();

        let mut backend = FsBackend::open(&cache).unwrap();
        backend
            .store(
                &CacheKey::for_texts(["hello"]),
                br#"{"ResultList":[{"Index":0,"Languages":[{"LanguageCode":"en","Score":0.99}]}],"ErrorList":[]}"#,
            )
            .unwrap();

        // SAFETY: no other test in this binary reads or writes these variables.
        unsafe {
            std::env::remove_var("AWS_ACCESS_KEY_ID");
            std::env::remove_var("AWS_SECRET_ACCESS_KEY");
        }

        let cli = parse(&[
            "detect-languages",
            questions.to_str().unwrap(),
            out.to_str().unwrap(),
            "--cache",
            cache.to_str().unwrap(),
            "--endpoint",
            "http://127.0.0.1:9",
        ])
        .unwrap();
        let (mode, args) = cli.command.into_parts();
        run(mode, args).unwrap();

        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "\"Question Id\",\"Language\",\"Score\"\n\"1\",\"en\",\"0.99\"\n"
        );
    }
}
