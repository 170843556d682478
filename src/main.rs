//! tonegen: text-to-music generation server with a MusicGen ONNX backend.
//!
//! This binary can run in two modes:
//! - Server mode (`--serve`): HTTP endpoint streaming `audio/wav`
//! - Offline mode: generate one WAV file per prompt

use std::time::Instant;

use tonegen::audio::{normalize_loudness, write_wav, DEFAULT_TARGET_DB};
use tonegen::cli::Cli;
use tonegen::config::{AppConfig, DEFAULT_DURATION_SEC};
use tonegen::generation::{AudioGenerator, GenerationService};
use tonegen::musicgen::{ensure_model_files, MusicGenBackend};
use tonegen::server;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    if cli.is_serve_mode() {
        run_serve_mode(&cli)
    } else if cli.is_offline_mode() {
        run_offline_mode(&cli)
    } else {
        print_usage();
        Ok(())
    }
}

/// Loads the model and serves HTTP requests.
///
/// Model download and session loading are blocking and happen before the
/// async runtime starts; only the server itself runs on it.
fn run_serve_mode(cli: &Cli) -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = AppConfig::from_env();
    if let Some(ref dir) = cli.model_dir {
        config.model_path = Some(dir.clone());
    }
    if let Some(ref bind) = cli.bind {
        config.bind_addr = bind.clone();
    }
    if let Some(duration) = cli.duration {
        config.duration_sec = duration;
    }

    if let Some(problem) = config.validate() {
        anyhow::bail!("invalid configuration: {}", problem);
    }

    let model_dir = config.effective_model_path();
    ensure_model_files(&model_dir)?;

    let backend = MusicGenBackend::load(&model_dir, config.threads)?;
    let service = GenerationService::new(Box::new(backend));

    tracing::info!(
        model = service.model_version(),
        sample_rate = service.sample_rate(),
        "generation service ready"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::start_server(config, service))
}

/// Runs offline generation: one WAV file per prompt, named by clip index.
fn run_offline_mode(cli: &Cli) -> anyhow::Result<()> {
    let duration = cli.duration.unwrap_or(DEFAULT_DURATION_SEC);
    let out_dir = cli.output_dir();
    let config = AppConfig::from_env();
    let model_dir = cli
        .model_dir
        .clone()
        .unwrap_or_else(|| config.effective_model_path());

    eprintln!("=== tonegen offline generation ===");
    for prompt in &cli.prompt {
        eprintln!("Prompt: \"{}\"", prompt);
    }
    eprintln!("Duration: {}s per clip", duration);
    eprintln!("Output directory: {}", out_dir.display());
    eprintln!("Model directory: {}", model_dir.display());
    eprintln!();

    eprintln!("Checking model files...");
    ensure_model_files(&model_dir)?;

    let mut backend = MusicGenBackend::load(&model_dir, config.threads)?;

    let start_time = Instant::now();
    let mut clips = backend.generate(&cli.prompt, duration)?;

    eprintln!();
    eprintln!(
        "Generated {} clip(s) in {:.2}s",
        clips.len(),
        start_time.elapsed().as_secs_f32()
    );

    std::fs::create_dir_all(&out_dir)?;

    // Every clip gets written: clip index is the filename.
    for (idx, clip) in clips.iter_mut().enumerate() {
        normalize_loudness(&mut clip.samples, DEFAULT_TARGET_DB);
        let path = out_dir.join(format!("{}.wav", idx));
        write_wav(&clip.samples, &path, clip.sample_rate, clip.channels)?;
        eprintln!("  Saved {} ({:.2}s)", path.display(), clip.duration_secs());
    }

    Ok(())
}

/// Prints usage information.
fn print_usage() {
    eprintln!("tonegen: text-to-music generation with a MusicGen ONNX backend");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Offline generation (one WAV per prompt):");
    eprintln!("    tonegen --prompt \"samba music\" --prompt \"lush chords\" --duration 10");
    eprintln!();
    eprintln!("  Server mode (GET /generate?prompt=... -> audio/wav):");
    eprintln!("    tonegen --serve --bind 127.0.0.1:8000");
    eprintln!();
    eprintln!("Run 'tonegen --help' for full options.");
}
