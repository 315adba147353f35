//! unresume CLI - résumé ingestion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unresume::extract::ExtractorRegistry;
use unresume::pdf::{encode_png, LopdfBackend};
use unresume::{
    analyze_text, resolve_kind, DocumentKind, ExtractOptions, IngestOptions, IngestReport,
    Ingestor, OcrConfig, OcrEngine, PageRasterizer, SourceFile, TextLayerExtractor,
};

#[derive(Parser)]
#[command(name = "unresume")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract structured résumé data from PDF and DOCX files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a résumé into a record plus diagnostics (JSON)
    Parse {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the extracted text
    Text {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print each page separately
        #[arg(long)]
        per_page: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input PDF or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Declared MIME type (detected from the file when omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Run the field analyzer on a plain-text file
    Analyze {
        /// UTF-8 text file
        #[arg(value_name = "TEXT_FILE")]
        input: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render PDF pages to PNG images
    Render {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Render scale (at least 1.5)
        #[arg(long, default_value_t = unresume::pdf::DEFAULT_RENDER_SCALE)]
        scale: f32,
    },

    /// Show version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Parse { .. } => "parse",
            Commands::Text { .. } => "text",
            Commands::Info { .. } => "info",
            Commands::Analyze { .. } => "analyze",
            Commands::Render { .. } => "render",
            Commands::Version => "version",
        }
    }
}

/// Flags shared by the commands that run the ingestion pipeline.
#[derive(Args)]
struct PipelineArgs {
    /// Declared MIME type (detected from the extension when omitted)
    #[arg(long)]
    mime: Option<String>,

    /// Disable the OCR fallback for image-only PDFs
    #[arg(long)]
    no_ocr: bool,

    /// OCR language(s), e.g. "eng" or "chi_sim+eng"
    #[arg(long, env = "UNRESUME_OCR_LANG", default_value = unresume::ocr::DEFAULT_LANGUAGE)]
    lang: String,

    /// Directory containing *.traineddata files
    #[arg(long, env = "UNRESUME_TESSDATA", value_name = "DIR")]
    tessdata: Option<PathBuf>,

    /// Recognize at most this many pages
    #[arg(long, default_value_t = unresume::ocr::DEFAULT_MAX_PAGES)]
    max_ocr_pages: usize,

    /// Render scale for OCR (at least 1.5)
    #[arg(long, default_value_t = unresume::pdf::DEFAULT_RENDER_SCALE)]
    scale: f32,

    /// Disable parallel line reconstruction
    #[arg(long)]
    sequential: bool,
}

impl PipelineArgs {
    fn ingest_options(&self) -> IngestOptions {
        let mut ocr = OcrConfig::new()
            .with_language(&self.lang)
            .with_max_pages(self.max_ocr_pages);
        if let Some(ref dir) = self.tessdata {
            ocr = ocr.with_tessdata(dir);
        }

        let extract = ExtractOptions::new()
            .with_render_scale(self.scale)
            .with_parallel(!self.sequential);

        log::debug!(
            "OCR {} (lang '{}', at most {} pages), render scale {}",
            if self.no_ocr { "disabled" } else { "enabled" },
            ocr.language,
            ocr.max_pages,
            extract.effective_render_scale()
        );
        IngestOptions::new()
            .with_ocr(!self.no_ocr)
            .with_ocr_config(ocr)
            .with_extract_options(extract)
    }

    fn source(&self, input: &Path) -> Result<SourceFile, Box<dyn std::error::Error>> {
        let mut source = SourceFile::from_path(input)?;
        if let Some(ref mime) = self.mime {
            log::debug!("Declared type {} overrides the extension", mime);
            source.mime_type = Some(mime.clone());
        }
        Ok(source)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    log::debug!("Running '{}'", cli.command.name());

    let result = match cli.command {
        Commands::Parse {
            input,
            pipeline,
            compact,
            output,
        } => cmd_parse(&input, &pipeline, compact, output.as_deref()),
        Commands::Text {
            input,
            pipeline,
            per_page,
            output,
        } => cmd_text(&input, &pipeline, per_page, output.as_deref()),
        Commands::Info { input, mime } => cmd_info(&input, mime.as_deref()),
        Commands::Analyze {
            input,
            compact,
            output,
        } => cmd_analyze(&input, compact, output.as_deref()),
        Commands::Render {
            input,
            output,
            scale,
        } => cmd_render(&input, output.as_deref(), scale),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Run the pipeline, showing OCR progress on stderr.
fn run_pipeline(
    input: &Path,
    pipeline: &PipelineArgs,
) -> Result<IngestReport, Box<dyn std::error::Error>> {
    let options = pipeline.ingest_options();
    let source = pipeline.source(input)?;
    let mut engine = OcrEngine::new(options.ocr.clone());
    let ingestor = Ingestor::new(options);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} OCR [{bar:40.cyan/blue}] {pos}%")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());

    let report = ingestor.ingest(&source, &mut engine, &mut |percent: u8| {
        if pb.is_hidden() {
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        pb.set_position(percent as u64);
    })?;

    if report.diagnostics.ocr_processing {
        pb.finish_and_clear();
    }
    if let Some(ref err) = report.diagnostics.ocr_error {
        eprintln!("{}: {}", "OCR unavailable".yellow(), err);
    }
    if !report.is_success() {
        eprintln!("{}: {}", "Warning".yellow().bold(), report.diagnostics.extracted_text);
    }

    Ok(report)
}

fn write_output(content: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_parse(
    input: &Path,
    pipeline: &PipelineArgs,
    compact: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = run_pipeline(input, pipeline)?;
    let json = report.to_json(!compact)?;
    write_output(&json, output)
}

fn cmd_text(
    input: &Path,
    pipeline: &PipelineArgs,
    per_page: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = run_pipeline(input, pipeline)?;
    let diagnostics = &report.diagnostics;

    let text = if per_page {
        diagnostics
            .text_by_page
            .iter()
            .enumerate()
            .map(|(i, page)| format!("--- Page {} ---\n{}", i + 1, page))
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        diagnostics.extracted_text.clone()
    };

    write_output(&text, output)
}

fn cmd_info(input: &Path, mime: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let source = SourceFile::from_path(input)?;
    let declared = mime.or(source.mime_type.as_deref());
    let kind = resolve_kind(declared, &source.bytes)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Size".bold(), format_size(source.bytes.len()));

    let result = match kind {
        DocumentKind::Pdf => {
            let backend = LopdfBackend::load_bytes(&source.bytes)?;
            println!("{}: PDF {}", "Format".bold(), backend.version());
            println!(
                "{}: {}",
                "Encrypted".bold(),
                if backend.is_encrypted() { "Yes" } else { "No" }
            );
            TextLayerExtractor::default().extract(&backend)
        }
        DocumentKind::Docx => {
            println!("{}: {}", "Format".bold(), kind);
            ExtractorRegistry::with_defaults().extract(kind, &source.bytes)?
        }
        other => {
            println!("{}: {}", "Format".bold(), other);
            println!("{}", "Not an ingestible document".yellow());
            return Ok(());
        }
    };

    println!("{}: {}", "Pages".bold(), result.page_count());

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let status = if result.success {
        "usable".green()
    } else if result.needs_ocr {
        "missing (needs OCR)".yellow()
    } else {
        "missing".red()
    };
    println!("{}: {}", "Text layer".bold(), status);
    println!(
        "{}: {}",
        "Images".bold(),
        if result.has_images { "Yes" } else { "No" }
    );

    if result.success {
        let words = result.full_text.split_whitespace().count();
        let chars = result.full_text.chars().count();
        println!("{}: {}", "Words".bold(), words);
        println!("{}: {}", "Characters".bold(), chars);
    }

    Ok(())
}

fn cmd_analyze(
    input: &Path,
    compact: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(input)?;
    let record = analyze_text(&text);

    let json = if compact {
        serde_json::to_string(&record)?
    } else {
        serde_json::to_string_pretty(&record)?
    };
    write_output(&json, output)
}

fn cmd_render(
    input: &Path,
    output: Option<&Path>,
    scale: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let backend = LopdfBackend::load_bytes(&data)?;
    let rasterizer = PageRasterizer::new(scale);

    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_pages", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let pages = rasterizer.raw_pages(&backend, &[]);
    let total = pages.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut written = 0;
    for page in pages {
        let filename = format!("page-{:03}.png", page.index);
        pb.set_message(filename.clone());
        match page.raster {
            Some(ref image) => {
                fs::write(output_dir.join(&filename), encode_png(image)?)?;
                log::debug!("Wrote {}", filename);
                written += 1;
            }
            None => pb.println(format!("{} page {}", "Skipped".yellow(), page.index)),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "{} {} of {} pages rendered at {}x to {}",
        "Done!".green().bold(),
        written,
        total,
        rasterizer.scale(),
        output_dir.display()
    );

    Ok(())
}

fn format_size(bytes: usize) -> String {
    match bytes {
        b if b >= 1 << 20 => format!("{:.1} MiB", b as f64 / (1 << 20) as f64),
        b if b >= 1 << 10 => format!("{:.1} KiB", b as f64 / (1 << 10) as f64),
        b => format!("{} B", b),
    }
}

fn cmd_version() {
    println!("{} {}", "unresume".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Résumé ingestion tool");
    println!();
    println!(
        "OCR: {}",
        if cfg!(feature = "tesseract") {
            "tesseract"
        } else {
            "not built in (enable the `tesseract` feature)"
        }
    );
    println!("Repository: {}", "https://github.com/iyulab/unresume".dimmed());
    println!("License: MIT");
}
