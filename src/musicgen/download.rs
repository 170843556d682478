//! Model downloader.
//!
//! Fetches missing MusicGen ONNX files from HuggingFace so a fresh install
//! works without manual setup.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Result, TonegenError};

use super::loader::MODEL_FILES;

/// Download sources for the musicgen-small fp16 export.
pub const MODEL_SOURCES: &[(&str, &str)] = &[
    (
        "config.json",
        "https://huggingface.co/gabotechs/music_gen/resolve/main/small/config.json",
    ),
    (
        "tokenizer.json",
        "https://huggingface.co/gabotechs/music_gen/resolve/main/small/tokenizer.json",
    ),
    (
        "text_encoder.onnx",
        "https://huggingface.co/gabotechs/music_gen/resolve/main/small_fp16/text_encoder.onnx",
    ),
    (
        "decoder_model.onnx",
        "https://huggingface.co/gabotechs/music_gen/resolve/main/small_fp16/decoder_model.onnx",
    ),
    (
        "decoder_with_past_model.onnx",
        "https://huggingface.co/gabotechs/music_gen/resolve/main/small_fp16/decoder_with_past_model.onnx",
    ),
    (
        "encodec_decode.onnx",
        "https://huggingface.co/gabotechs/music_gen/resolve/main/small_fp16/encodec_decode.onnx",
    ),
];

/// Downloads any missing model files into the directory.
///
/// Returns Ok(()) once every required file exists. `config.json` is fetched
/// too when missing, but a failure there is ignored since the loader has
/// defaults for it.
pub fn ensure_model_files(model_dir: &Path) -> Result<()> {
    if !model_dir.exists() {
        fs::create_dir_all(model_dir).map_err(|e| {
            TonegenError::model_download_failed(format!(
                "failed to create model directory {}: {}",
                model_dir.display(),
                e
            ))
        })?;
    }

    let missing: Vec<&str> = MODEL_FILES
        .iter()
        .copied()
        .filter(|file| !model_dir.join(file).exists())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    eprintln!("Downloading {} missing model files...", missing.len());
    eprintln!("(This may take several minutes on first run)");

    for file in &missing {
        let url = MODEL_SOURCES
            .iter()
            .find(|(name, _)| name == file)
            .map(|(_, url)| *url)
            .ok_or_else(|| {
                TonegenError::model_download_failed(format!("no download URL for {}", file))
            })?;

        download_file(url, &model_dir.join(file))?;
    }

    let config_path = model_dir.join("config.json");
    if !config_path.exists() {
        if let Some((_, url)) = MODEL_SOURCES.iter().find(|(name, _)| *name == "config.json") {
            let _ = download_file(url, &config_path);
        }
    }

    eprintln!("All model files downloaded.");
    Ok(())
}

/// Streams one file to disk in 64 KB chunks, with coarse progress output.
fn download_file(url: &str, dest: &Path) -> Result<()> {
    let filename = dest.file_name().unwrap_or_default().to_string_lossy();
    eprint!("  {}... ", filename);

    // The decoder models run to hundreds of megabytes; give the transfer an
    // hour before giving up.
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(3600))
        .build()
        .map_err(|e| {
            TonegenError::model_download_failed(format!("failed to create HTTP client: {}", e))
        })?;

    let mut response = client.get(url).send().map_err(|e| {
        TonegenError::model_download_failed(format!("failed to download {}: {}", url, e))
    })?;

    if !response.status().is_success() {
        return Err(TonegenError::model_download_failed(format!(
            "HTTP {} for {}",
            response.status(),
            url
        )));
    }

    let total_size = response.content_length().unwrap_or(0);

    let mut file = fs::File::create(dest).map_err(|e| {
        TonegenError::model_download_failed(format!(
            "failed to create file {}: {}",
            dest.display(),
            e
        ))
    })?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 65536];
    let mut last_progress = 0;

    loop {
        let bytes_read = response.read(&mut buffer).map_err(|e| {
            TonegenError::model_download_failed(format!("failed to read response: {}", e))
        })?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read]).map_err(|e| {
            TonegenError::model_download_failed(format!("failed to write file: {}", e))
        })?;

        downloaded += bytes_read as u64;

        if total_size > 0 {
            let progress = (downloaded * 100 / total_size) as usize;
            if progress >= last_progress + 10 {
                eprint!("{}%... ", progress);
                last_progress = progress;
            }
        }
    }

    eprintln!("done ({:.1} MB)", downloaded as f64 / (1024.0 * 1024.0));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_required_file_has_a_source() {
        for file in MODEL_FILES {
            assert!(
                MODEL_SOURCES.iter().any(|(name, _)| name == file),
                "missing URL for required file: {}",
                file
            );
        }
    }

    #[test]
    fn sources_point_at_huggingface() {
        for (_, url) in MODEL_SOURCES {
            assert!(url.starts_with("https://huggingface.co/"));
        }
    }
}
