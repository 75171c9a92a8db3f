mod cli;

use reportforge::{
    config,
    context::AppContext,
    images::{codec, CompressionPreset, UploadFile},
    report::ReportForm,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, DraftAction, Layout};
use std::path::Path;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reportforge=trace,reportforge_db=debug,reportforge_common=debug".to_string()
        } else {
            "reportforge=info,reportforge_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { config } => validate_config(config.as_deref().or(cli.config.as_deref())),
        Commands::Version => {
            println!("reportforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Compress {
            input,
            output,
            max_dimension,
            quality,
        } => compress_file(&input, output.as_deref(), max_dimension, quality),
        command => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run(command, cli.config.as_deref()))
        }
    }
}

async fn run(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = AppContext::from_config(config)?;

    match command {
        Commands::Draft { action } => match action {
            DraftAction::Save { form } => {
                let form = read_form(&form)?;
                let outcome = ctx.reports.save_draft(&form).await?;
                if let Some(warning) = outcome.warning() {
                    eprintln!("Warning: {}", warning);
                }
                println!("Draft saved: {}", outcome.id);
            }
            DraftAction::Show => match ctx.reports.get_draft()? {
                Some(slot) => println!("{}", serde_json::to_string_pretty(&slot)?),
                None => println!("No draft saved"),
            },
            DraftAction::Clear => {
                if ctx.reports.clear_draft()? {
                    println!("Draft cleared");
                } else {
                    println!("No draft saved");
                }
            }
        },
        Commands::Submit { form, id } => {
            let form = read_form(&form)?;
            let outcome = ctx.reports.submit(&form, id.as_deref()).await?;
            if let Some(warning) = outcome.warning() {
                eprintln!("Warning: {}", warning);
            }
            println!("Report submitted: {}", outcome.id);
        }
        Commands::Show {
            id,
            resolve,
            layout,
        } => match layout {
            Layout::Magazine => {
                for src in ctx.reports.magazine_images(&id).await? {
                    println!("{}", src);
                }
            }
            Layout::Letter => {
                let report = if resolve {
                    ctx.reports.load_resolved(&id).await?
                } else {
                    ctx.reports.get(&id).await?
                };
                let report = report.with_context(|| format!("Report not found: {}", id))?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        },
        Commands::List { json } => {
            let reports = ctx.reports.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!(
                        "{}  {:<9}  {}  {}",
                        report.id.as_deref().unwrap_or("-"),
                        report.status.to_string(),
                        report.created_at.as_deref().unwrap_or("-"),
                        report.activity_name
                    );
                }
                println!("{} report(s)", reports.len());
            }
        }
        Commands::Delete { id } => {
            if ctx.reports.delete(&id).await? {
                println!("Deleted {}", id);
            } else {
                anyhow::bail!("Report not found: {}", id);
            }
        }
        Commands::Resolve { refs, timeout_ms } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| ctx.resolver().timeout());
            let resolved = ctx.resolver().resolve_all(&refs, timeout).await;
            println!("Resolved {} of {} reference(s)", resolved.len(), refs.len());
            for src in resolved {
                println!("{}", src);
            }
        }
        Commands::Upload { files, folder } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read image: {:?}", path))?;
                uploads.push(UploadFile {
                    bytes,
                    file_name: file_name_of(path),
                    content_type: content_type_of(path).to_string(),
                });
            }

            let summary = ctx.uploader.upload_many(&uploads, &folder).await;
            for reference in &summary.refs {
                println!("{}", reference);
            }
            if summary.failed > 0 {
                eprintln!("Warning: {} of {} uploads failed", summary.failed, files.len());
            }
        }
        Commands::Gallery => {
            let images = ctx.reports.gallery().await?;
            println!("{}", serde_json::to_string_pretty(&images)?);
        }
        Commands::ClearCache => {
            let removed = ctx.resolver().cache().clear();
            println!("Removed {} cached image(s)", removed);
        }
        Commands::Validate { .. } | Commands::Version | Commands::Compress { .. } => {}
    }

    Ok(())
}

fn read_form(path: &Path) -> Result<ReportForm> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse form file: {:?}", path))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn content_type_of(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

fn compress_file(
    input: &Path,
    output: Option<&Path>,
    max_dimension: Option<u32>,
    quality: Option<f32>,
) -> Result<()> {
    let mut preset = CompressionPreset::BLOB;
    if let Some(max_dimension) = max_dimension {
        preset.max_dimension = max_dimension;
    }
    if let Some(quality) = quality {
        if !(0.0..=1.0).contains(&quality) {
            anyhow::bail!("Quality must be between 0 and 1, got {}", quality);
        }
        preset.quality = quality;
    }

    let data =
        std::fs::read(input).with_context(|| format!("Failed to read image: {:?}", input))?;
    let compressed = codec::compress_bytes(&data, preset)?;

    eprintln!(
        "{}x{} -> {}x{}, {} -> {} bytes",
        compressed.original_width,
        compressed.original_height,
        compressed.width,
        compressed.height,
        data.len(),
        compressed.bytes.len()
    );

    match output {
        Some(path) => std::fs::write(path, &compressed.bytes)
            .with_context(|| format!("Failed to write {:?}", path))?,
        None => println!("{}", compressed.to_data_uri()),
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Database: {:?}", config.database.path);
            println!("  Image storage: {}", config.images.storage);
            println!("  Resolve timeout: {}ms", config.resolve.timeout_ms);
            println!(
                "  Legacy store: {}",
                config.legacy.base_url.as_deref().unwrap_or("local database")
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Database: {:?}", config.database.path);
            println!("  Image storage: {}", config.images.storage);
        }
    }

    Ok(())
}
