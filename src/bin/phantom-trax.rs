use clap::{Parser, Subcommand};
use phantom_trax::{
    analyze_upload, default_staging_dir, load_registry, set_download_progress_callback,
    set_poll_progress_callback, stage_upload, CompletedRemix, Config, JobStatus, RemixEngine,
    RemixHistory, RemixOptions, RemixStage, TokenDiagnostic,
};
use std::{
    path::{Path, PathBuf},
    process,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phantom-trax")]
#[command(about = "AI audio remix engine", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remix a clip once per prompt, then print the session history
    Remix {
        #[arg(short, long)]
        input: PathBuf,

        /// Style description; repeat for several remixes of the same clip
        #[arg(short, long)]
        prompt: Vec<String>,

        /// Genre used for the generated prompt when none is typed
        #[arg(short, long, default_value = "electronic")]
        genre: String,

        /// Seconds of audio to generate (defaults to the clip length)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(5..=30))]
        duration: Option<u32>,

        /// Creativity, 0.0 to 1.5
        #[arg(short, long, default_value_t = 0.8, value_parser = parse_temperature)]
        temperature: f64,

        /// Integer seed; anything else is ignored
        #[arg(short, long, default_value = "")]
        seed: String,

        /// Skip BPM/key detection
        #[arg(long)]
        no_detect: bool,

        /// Send the prompt as typed instead of rewriting it
        #[arg(long)]
        no_optimize: bool,

        #[arg(long, default_value = "")]
        music_model: String,

        #[arg(long, default_value = "")]
        text_model: String,

        /// Also download each result into this directory
        #[arg(long)]
        download: Option<PathBuf>,

        #[arg(short, long)]
        quiet: bool,
    },

    /// Print tempo, key and duration of a clip
    Analyze {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Rewrite a style prompt with the text model
    Optimize {
        prompt: String,

        #[arg(long, default_value = "")]
        text_model: String,
    },

    /// Check that the API credential is visible
    Check,

    /// List available models
    List,
}

fn parse_temperature(s: &str) -> Result<f64, String> {
    let t: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.5).contains(&t) {
        Ok(t)
    } else {
        Err(format!("temperature must be between 0.0 and 1.5, got {t}"))
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env();

    let result = match cli.command {
        Commands::Remix {
            input,
            prompt,
            genre,
            duration,
            temperature,
            seed,
            no_detect,
            no_optimize,
            music_model,
            text_model,
            download,
            quiet,
        } => {
            let opts = RemixOptions {
                prompt: None,
                genre,
                duration_secs: duration,
                temperature,
                seed,
                detect_features: !no_detect,
                optimize_prompt: !no_optimize,
            };
            handle_remix(
                &config,
                &input,
                prompt,
                opts,
                &music_model,
                &text_model,
                download.as_deref(),
                quiet,
            )
        }
        Commands::Analyze { input } => handle_analyze(&input),
        Commands::Optimize { prompt, text_model } => {
            handle_optimize(&config, &prompt, &text_model)
        }
        Commands::Check => handle_check(&config),
        Commands::List => handle_list(),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn report_credential(config: &Config) {
    match &config.token_diagnostic {
        TokenDiagnostic::Missing => {
            eprintln!("❌ REPLICATE_API_TOKEN is not set. Generation is disabled.");
        }
        TokenDiagnostic::Present { len } => {
            eprintln!("🔑 API token found ({len} chars)");
        }
        TokenDiagnostic::Cleaned { len, issues } => {
            eprintln!(
                "⚠️  API token found ({len} chars) but had {}; using the cleaned value",
                issues.join(" and ")
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_remix(
    config: &Config,
    input: &Path,
    prompts: Vec<String>,
    mut opts: RemixOptions,
    music_model: &str,
    text_model: &str,
    download: Option<&Path>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.token_diagnostic.is_missing() {
        report_credential(config);
        return Err(phantom_trax::RemixError::MissingCredential.into());
    }

    let engine = RemixEngine::from_config(config, music_model, text_model)?;

    let staging = match &config.staging_dir {
        Some(dir) => dir.clone(),
        None => default_staging_dir()?,
    };
    let staged = stage_upload(input, &staging)?;

    let analysis = analyze_upload(&staged, opts.detect_features);

    if !quiet {
        setup_progress_callbacks();
        eprintln!("👻 Phantom Trax");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("Input:    {}", input.display());
        eprintln!("BPM:      {}", analysis.tags.tempo);
        eprintln!("Key:      {}", analysis.tags.key);
        eprintln!("Length:   {}s", analysis.tags.duration);
        if let Some(err) = &analysis.error {
            eprintln!("⚠️  Could not analyze audio: {err}");
        }
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // One job with the generated prompt when nothing was typed.
    let prompts: Vec<Option<String>> = if prompts.is_empty() {
        vec![None]
    } else {
        prompts.into_iter().map(Some).collect()
    };

    let mut history = RemixHistory::new();
    let mut failures = 0usize;

    for prompt in prompts {
        opts.prompt = prompt;

        let outcome = engine.remix(&staged, &analysis, &opts, |stage| {
            if quiet {
                return;
            }
            match stage {
                RemixStage::Optimizing => eprintln!("🧠 Optimizing your prompt..."),
                RemixStage::Optimized(p) => eprintln!("✨ Optimized prompt: {p}"),
                RemixStage::Uploading => eprintln!("📡 Uploading to GPU cloud..."),
                RemixStage::Generating { job_id } => {
                    eprintln!("🎵 Generating audio (job {job_id})...")
                }
            }
        });

        match outcome {
            Ok(done) => {
                if !quiet {
                    eprintln!();
                    eprintln!("✅ Remix complete: {}", done.output_url);
                } else {
                    println!("{}", done.output_url);
                }

                match keep_remix(&mut history, &done, engine.client().http(), download) {
                    Ok(Some(dest)) if !quiet => eprintln!("⬇️  Saved {}", dest.display()),
                    Ok(_) => {}
                    Err(e) => {
                        failures += 1;
                        eprintln!("❌ Download failed for {}: {e}", done.output_url);
                    }
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!();
                eprintln!("❌ Generation failed: {e}");
            }
        }
    }

    if !quiet && !history.is_empty() {
        eprintln!();
        eprintln!("📜 Session history");
        for entry in history.entries() {
            let seed = if entry.seed.is_empty() { "-" } else { entry.seed.as_str() };
            eprintln!("  [{}] seed={} {}", entry.timestamp, seed, entry.prompt);
            eprintln!("      {}", entry.output_url);
        }
    }

    if failures > 0 {
        return Err(format!("{failures} remix(es) failed or could not be saved").into());
    }
    Ok(())
}

/// Records a finished remix, then downloads it into `download` as
/// `<job id>.wav` when a directory was given. The history entry is kept even
/// if the download fails.
fn keep_remix(
    history: &mut RemixHistory,
    done: &CompletedRemix,
    http: &reqwest::blocking::Client,
    download: Option<&Path>,
) -> phantom_trax::Result<Option<PathBuf>> {
    history.record(done.history_entry());

    let Some(dir) = download else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)?;
    let dest = dir.join(format!("{}.wav", done.job_id));
    phantom_trax::download_with_progress(http, &done.output_url, &dest)?;
    Ok(Some(dest))
}

fn handle_analyze(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let analysis = analyze_upload(input, true);
    println!("BPM:      {}", analysis.tags.tempo);
    println!("Key:      {}", analysis.tags.key);
    println!("Duration: {}", analysis.tags.duration);
    match analysis.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn handle_optimize(
    config: &Config,
    prompt: &str,
    text_model: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.token_diagnostic.is_missing() {
        report_credential(config);
        return Err(phantom_trax::RemixError::MissingCredential.into());
    }
    let engine = RemixEngine::from_config(config, "", text_model)?;
    println!("{}", engine.optimizer().optimize(prompt)?);
    Ok(())
}

fn handle_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    report_credential(config);
    eprintln!("API base: {}", config.api_base_url);
    if config.token_diagnostic.is_missing() {
        return Err(phantom_trax::RemixError::MissingCredential.into());
    }
    Ok(())
}

fn handle_list() -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry()?;

    eprintln!("📋 Available Models");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for model in &registry.models {
        let is_default = model.name == registry.default_for(model.kind);
        let marker = if is_default { " (default)" } else { "" };
        eprintln!("  • [{}] {}{}", model.kind, model.name, marker);
    }

    eprintln!();
    eprintln!("Use --music-model / --text-model <name> to pick a model");

    Ok(())
}

fn setup_progress_callbacks() {
    set_download_progress_callback(|downloaded, total| {
        if total > 0 {
            let percent = (downloaded as f64 / total as f64 * 100.0).round() as u64;
            let downloaded_mb = downloaded as f64 / 1_000_000.0;
            let total_mb = total as f64 / 1_000_000.0;
            eprint!(
                "\r📥 Downloading remix: {:>3}% ({:.2} MB / {:.2} MB)",
                percent, downloaded_mb, total_mb
            );
            if downloaded >= total {
                eprintln!();
            }
        } else {
            eprint!("\r📥 Downloading remix: {:.2} MB", downloaded as f64 / 1_000_000.0);
        }
    });

    set_poll_progress_callback(|progress| {
        let label = match progress.status {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "generating",
            JobStatus::Succeeded => "done",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        };
        eprint!(
            "\r🔄 {:>3}% {:<10} elapsed {:>3}s, ~{:>3}s left",
            progress.percent,
            label,
            progress.elapsed.as_secs(),
            progress.remaining.as_secs()
        );
        if progress.status.is_terminal() {
            eprintln!();
        }
    });
}
