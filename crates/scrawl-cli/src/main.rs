//! Scrawl CLI - render text into handwritten page images

use clap::{Parser, Subcommand};
use scrawl::prelude::*;
use scrawl_core::error::{Result, ScrawlError};
use scrawl_core::estimate_page_count;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scrawl")]
#[command(author, version, about = "Turn typed text into handwritten pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render text onto paper and write the pages out
    Render {
        /// Text to render; use --text-file for longer documents
        #[arg(short = 't', long)]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(long = "text-file")]
        text_file: Option<PathBuf>,

        /// Handwriting font file (TTF/OTF)
        #[arg(short = 'f', long = "font-file")]
        font_file: PathBuf,

        /// Family name to register the font under
        #[arg(long = "font-family", default_value = "Handwriting")]
        font_family: String,

        /// Directory holding paper textures and rule metadata
        #[arg(long = "paper-dir", default_value = "assets/paper")]
        paper_dir: PathBuf,

        /// Paper template id; expects <id>.png in the paper directory
        #[arg(long)]
        template: Option<String>,

        /// Treat the template as lined paper with rule metadata
        #[arg(long)]
        lined: bool,

        /// Where the rendered pages land
        #[arg(short = 'o', long = "output-dir", default_value = "out")]
        output_dir: PathBuf,

        /// Filename stem for the pages
        #[arg(long, default_value = "page")]
        stem: String,

        /// Export format: png, jpeg, or webp
        #[arg(long, default_value = "png")]
        format: String,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 1130)]
        height: u32,

        #[arg(long = "font-size", default_value_t = 24.0)]
        font_size: f32,

        /// Ink color as RRGGBB hex
        #[arg(long, default_value = "1A237E")]
        ink: String,

        /// Analog grain level: 1 heaviest, 5 cleanest
        #[arg(long, default_value_t = 3)]
        realism: u8,

        #[arg(long = "words-per-page", default_value_t = 250)]
        words_per_page: usize,

        #[arg(long = "max-pages", default_value_t = 10)]
        max_pages: usize,

        /// Quality preset: auto, low, medium, high, ultra
        #[arg(long, default_value = "auto")]
        quality: String,

        /// Variation style: realistic or subtle
        #[arg(long, default_value = "realistic")]
        style: String,

        /// Bundle all pages into one <stem>.tar.gz
        #[arg(long)]
        archive: bool,
    },

    /// Show how a text would split into pages, without rendering
    Info {
        #[arg(short = 't', long)]
        text: Option<String>,

        #[arg(long = "text-file")]
        text_file: Option<PathBuf>,

        #[arg(long = "words-per-page", default_value_t = 250)]
        words_per_page: usize,
    },
}

fn read_text(text: Option<String>, text_file: Option<PathBuf>) -> Result<String> {
    match (text, text_file) {
        (Some(t), None) => Ok(t),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (Some(_), Some(_)) => Err(ScrawlError::Config(
            "--text and --text-file are mutually exclusive".to_string(),
        )),
        (None, None) => Err(ScrawlError::Config(
            "provide --text or --text-file".to_string(),
        )),
    }
}

fn parse_preset(name: &str) -> Result<QualityPreset> {
    match name.to_ascii_lowercase().as_str() {
        "auto" => Ok(QualityPreset::Auto),
        "low" => Ok(QualityPreset::Low),
        "medium" => Ok(QualityPreset::Medium),
        "high" => Ok(QualityPreset::High),
        "ultra" => Ok(QualityPreset::Ultra),
        other => Err(ScrawlError::Config(format!("unknown quality preset '{other}'"))),
    }
}

fn parse_style(name: &str) -> Result<StrategyKind> {
    match name.to_ascii_lowercase().as_str() {
        "realistic" => Ok(StrategyKind::Realistic),
        "subtle" => Ok(StrategyKind::Subtle),
        other => Err(ScrawlError::Config(format!("unknown variation style '{other}'"))),
    }
}

fn parse_ink(hex: &str) -> Result<Color> {
    Color::from_hex(hex)
        .ok_or_else(|| ScrawlError::Config(format!("'{hex}' is not an RRGGBB color")))
}

#[allow(clippy::too_many_arguments)]
fn run_render(
    text: String,
    font_file: PathBuf,
    font_family: String,
    paper_dir: PathBuf,
    template: Option<String>,
    lined: bool,
    output_dir: PathBuf,
    stem: String,
    format: String,
    config: RenderConfig,
    preset: QualityPreset,
    style: StrategyKind,
    archive: bool,
) -> Result<()> {
    let scrawl = Scrawl::builder(paper_dir)
        .quality_preset(preset)
        .variation_strategy(style)
        .build();

    let font_bytes = std::fs::read(&font_file)?;
    scrawl.register_font(&font_family, font_bytes)?;

    let mut config = config;
    config.text = text;
    config.font_family = font_family;
    config.template = template.map(|id| {
        let kind = if lined { PaperKind::Lined } else { PaperKind::Blank };
        PaperTemplate::new(id.clone(), id.clone(), format!("{id}.png"), kind)
    });

    let document = scrawl.render_document(&config)?;
    if document.fallback_pages > 0 {
        log::warn!("{} page(s) used a fallback render path", document.fallback_pages);
    }

    let format = ExportFormat::normalize(&format);
    let exported = scrawl.export_pages(&document, format);
    let failed = exported.iter().filter(|r| !r.success).count();
    if failed > 0 {
        log::warn!("{failed} page(s) failed to encode");
    }

    if archive {
        let result = scrawl.download_archive(&exported, &output_dir, &stem);
        if !result.success {
            return Err(ScrawlError::Other(
                result.error.unwrap_or_else(|| "archive failed".to_string()),
            ));
        }
        println!(
            "wrote {} page(s) to {}/{} ({} bytes)",
            document.pages.len(),
            output_dir.display(),
            result.filename,
            result.size
        );
    } else {
        let results = scrawl.download_pages(&exported, &output_dir, &stem);
        let written = results.iter().filter(|r| r.success).count();
        println!("wrote {written} page(s) to {}", output_dir.display());
    }

    if document.split.truncated {
        println!(
            "note: text truncated at {} pages, {} word(s) dropped",
            document.split.total_pages,
            document.split.remaining_words.unwrap_or(0)
        );
    }
    Ok(())
}

fn run_info(text: String, words_per_page: usize) -> Result<()> {
    let words = text.split_whitespace().count();
    let pages = estimate_page_count(&text, words_per_page);
    println!("{words} word(s), {pages} page(s) at {words_per_page} words per page");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            text,
            text_file,
            font_file,
            font_family,
            paper_dir,
            template,
            lined,
            output_dir,
            stem,
            format,
            width,
            height,
            font_size,
            ink,
            realism,
            words_per_page,
            max_pages,
            quality,
            style,
            archive,
        } => {
            let text = read_text(text, text_file)?;
            let config = RenderConfig {
                canvas_width: width,
                canvas_height: height,
                font_size,
                ink_color: parse_ink(&ink)?,
                realism,
                words_per_page,
                max_pages,
                ..RenderConfig::default()
            };
            run_render(
                text,
                font_file,
                font_family,
                paper_dir,
                template,
                lined,
                output_dir,
                stem,
                format,
                config,
                parse_preset(&quality)?,
                parse_style(&style)?,
                archive,
            )
        },
        Command::Info {
            text,
            text_file,
            words_per_page,
        } => run_info(read_text(text, text_file)?, words_per_page),
    }
}
