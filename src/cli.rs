//! CLI argument parser.
//!
//! The binary runs in two modes: an HTTP server (`--serve`) and an offline
//! mode that generates one clip per `--prompt` and writes WAV files to disk.

use std::path::PathBuf;

use clap::Parser;

/// tonegen: text-to-music generation with a MusicGen ONNX backend
#[derive(Parser, Debug)]
#[command(name = "tonegen")]
#[command(about = "Text-to-music generation server with a MusicGen ONNX backend")]
#[command(version)]
pub struct Cli {
    /// Text prompt describing the audio to generate (repeat for multiple clips)
    #[arg(short, long)]
    pub prompt: Vec<String>,

    /// Duration of each clip in seconds (1-30)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=30))]
    pub duration: Option<u32>,

    /// Output directory for offline WAV files
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Path to the directory containing ONNX model files
    #[arg(short, long)]
    pub model_dir: Option<PathBuf>,

    /// Run the HTTP server
    #[arg(long)]
    pub serve: bool,

    /// Socket address to listen on (server mode)
    #[arg(long)]
    pub bind: Option<String>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if running the HTTP server.
    pub fn is_serve_mode(&self) -> bool {
        self.serve
    }

    /// Returns true if running offline generation.
    pub fn is_offline_mode(&self) -> bool {
        !self.serve && !self.prompt.is_empty()
    }

    /// Returns the effective output directory for offline mode.
    ///
    /// Defaults to the current directory if not specified.
    pub fn output_dir(&self) -> PathBuf {
        self.out_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            prompt: vec![],
            duration: None,
            out_dir: None,
            model_dir: None,
            serve: false,
            bind: None,
        }
    }

    #[test]
    fn serve_mode_detection() {
        let cli = Cli {
            serve: true,
            ..base_cli()
        };
        assert!(cli.is_serve_mode());
        assert!(!cli.is_offline_mode());
    }

    #[test]
    fn offline_mode_requires_a_prompt() {
        let no_prompt = base_cli();
        assert!(!no_prompt.is_offline_mode());

        let with_prompt = Cli {
            prompt: vec!["samba music".to_string()],
            ..base_cli()
        };
        assert!(with_prompt.is_offline_mode());
    }

    #[test]
    fn serve_flag_wins_over_prompts() {
        let cli = Cli {
            prompt: vec!["samba music".to_string()],
            serve: true,
            ..base_cli()
        };
        assert!(cli.is_serve_mode());
        assert!(!cli.is_offline_mode());
    }

    #[test]
    fn output_dir_defaults_to_cwd() {
        let cli = base_cli();
        assert_eq!(cli.output_dir(), PathBuf::from("."));

        let cli = Cli {
            out_dir: Some(PathBuf::from("/tmp/clips")),
            ..base_cli()
        };
        assert_eq!(cli.output_dir(), PathBuf::from("/tmp/clips"));
    }
}
