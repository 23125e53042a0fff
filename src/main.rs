use aim_rs::{scanner, AimError, Config, ExifTool, ImageTagger, MetadataWriter, OllamaClient};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.verbose);

    let writer = ExifTool::new(&config.exiftool, config.keep_backup);

    if config.inspect {
        return inspect(&config, &writer);
    }

    let settings = config
        .model_settings()
        .context("Failed to resolve model settings")?;
    info!(
        "model {} at {} (temperature {})",
        settings.model, config.ollama_host, settings.temperature
    );

    let describer = OllamaClient::new(&config.ollama_host, &settings, config.request_timeout())?;
    let tagger = ImageTagger::new(describer, writer, config).with_progress(true);

    let summary = tagger.run()?;
    print!("{}", summary);

    if !summary.is_clean() {
        warn!("{} file(s) were not tagged", summary.failed());
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Print the current metadata of every discovered image.
fn inspect(config: &Config, exiftool: &ExifTool) -> Result<()> {
    exiftool.ensure_available()?;

    for path in scanner::collect_image_files(&config.input_path, config.recursive)? {
        match exiftool.read_metadata(&path) {
            Ok(tags) => {
                println!("{}", path.display());
                for (key, value) in tags {
                    println!("  {}: {}", key, display_value(&value));
                }
            }
            Err(e @ AimError::ToolNotFound { .. }) => return Err(e.into()),
            Err(e) => warn!("{}: {}", path.display(), e),
        }
    }
    Ok(())
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
