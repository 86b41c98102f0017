//! pagetext CLI - PDF text extraction with OCR fallback and summaries

mod summarize;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagetext::summary_pdf::DEFAULT_TITLE;
use pagetext::{
    Document, EngineMode, EnhanceOptions, ExtractOptions, Extraction, OcrErrorPolicy, OcrMode,
    PageSegMode, PageSelection, Pdftoppm, Pipeline, TesseractCli,
};

use summarize::{DeepSeekClient, DEFAULT_BASE_URL, DEFAULT_MODEL};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pagetext")]
#[command(version)]
#[command(about = "Extract text from PDFs, with OCR for scanned pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text of a PDF
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit the text with a per-page report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Extract a PDF and summarize it
    Summarize {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Also write the summary as a PDF
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,

        /// Title of the summary PDF
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,

        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Ask a free-form question
    Ask {
        /// The question
        #[arg(value_name = "MESSAGE")]
        message: String,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ExtractArgs {
    /// OCR language hint
    #[arg(long, default_value = "por+eng")]
    lang: String,

    /// Page segmentation mode (1, 3, 4, 6, 11)
    #[arg(long, default_value_t = 6, value_parser = parse_psm)]
    psm: u8,

    /// OCR engine mode (0-3)
    #[arg(long, default_value_t = 3, value_parser = parse_oem)]
    oem: u8,

    /// Rasterization resolution for OCR
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// What to do when OCR of a page fails (skip_page, abort_document)
    #[arg(long, default_value = "skip_page")]
    on_ocr_error: OcrErrorPolicy,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Use the text layer only
    #[arg(long)]
    no_ocr: bool,

    /// Path to the tesseract binary
    #[arg(long, env = "PAGETEXT_TESSERACT", value_name = "PATH")]
    tesseract: Option<PathBuf>,

    /// Path to the pdftoppm binary
    #[arg(long, env = "PAGETEXT_PDFTOPPM", value_name = "PATH")]
    pdftoppm: Option<PathBuf>,

    /// Contrast factor applied before OCR
    #[arg(long, default_value_t = 2.0)]
    contrast: f32,

    /// Sharpness factor applied before OCR
    #[arg(long, default_value_t = 2.0)]
    sharpness: f32,
}

#[derive(Args)]
struct ApiArgs {
    /// API key for the summarization endpoint
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the summarization endpoint
    #[arg(long, env = "DEEPSEEK_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
}

fn parse_psm(s: &str) -> Result<u8, String> {
    let code: u8 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    PageSegMode::from_code(code)
        .map(|mode| mode.code())
        .ok_or_else(|| format!("unsupported page segmentation mode {}", code))
}

fn parse_oem(s: &str) -> Result<u8, String> {
    let code: u8 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    EngineMode::from_code(code)
        .map(|mode| mode.code())
        .ok_or_else(|| format!("unsupported engine mode {}", code))
}

impl ExtractArgs {
    fn options(&self) -> CliResult<ExtractOptions> {
        let pages = match &self.pages {
            Some(p) => PageSelection::parse(p)?,
            None => PageSelection::All,
        };
        let mode = OcrMode {
            segmentation: PageSegMode::from_code(self.psm).unwrap_or_default(),
            engine: EngineMode::from_code(self.oem).unwrap_or_default(),
        };

        Ok(ExtractOptions::new()
            .with_language_hint(self.lang.clone())
            .with_ocr_mode(mode)
            .with_raster_dpi(self.dpi)
            .with_ocr_error_policy(self.on_ocr_error)
            .with_enhance(EnhanceOptions {
                contrast: self.contrast,
                sharpness: self.sharpness,
            })
            .with_pages(pages))
    }

    fn pipeline(&self) -> CliResult<Pipeline> {
        let mut pipeline = Pipeline::new(self.options()?);
        if self.no_ocr {
            return Ok(pipeline.without_ocr());
        }
        if let Some(program) = &self.tesseract {
            pipeline = pipeline.with_ocr_engine(TesseractCli::with_program(program));
        }
        if let Some(program) = &self.pdftoppm {
            pipeline = pipeline.with_rasterizer(Pdftoppm::with_program(program));
        }
        Ok(pipeline)
    }
}

impl ApiArgs {
    fn client(&self) -> CliResult<DeepSeekClient> {
        Ok(DeepSeekClient::from_key(self.api_key.clone())?
            .with_base_url(&self.api_url)
            .with_model(&self.model))
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Text {
            input,
            output,
            json,
            extract,
        } => cmd_text(&input, output.as_deref(), json, &extract),
        Commands::Summarize {
            input,
            pdf,
            title,
            extract,
            api,
        } => cmd_summarize(&input, pdf.as_deref(), &title, &extract, &api),
        Commands::Ask { message, api } => cmd_ask(&message, &api),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// 2 for problems with the user's input, 1 for everything else.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<pagetext::Error>() {
        Some(err) if err.is_user_facing() => 2,
        _ => 1,
    }
}

fn extract(input: &Path, args: &ExtractArgs) -> CliResult<Extraction> {
    let pipeline = args.pipeline()?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {}...", input.display()));

    let result = Document::open(input).and_then(|document| pipeline.extract(&document));
    pb.finish_and_clear();

    let extraction = result?;
    for report in extraction.warnings() {
        eprintln!(
            "{} page {}: {}",
            "warning".yellow(),
            report.number,
            report.warning.as_deref().unwrap_or_default()
        );
    }
    log::info!(
        "{} pages read directly, {} recovered by OCR, {} without text",
        extraction.direct_pages(),
        extraction.ocr_pages(),
        extraction.skipped_pages()
    );
    Ok(extraction)
}

fn cmd_text(input: &Path, output: Option<&Path>, json: bool, args: &ExtractArgs) -> CliResult<()> {
    let extraction = extract(input, args)?;

    let content = if json {
        serde_json::to_string_pretty(&extraction)?
    } else {
        extraction.into_text()
    };

    if let Some(path) = output {
        fs::write(path, &content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}

fn cmd_summarize(
    input: &Path,
    pdf: Option<&Path>,
    title: &str,
    args: &ExtractArgs,
    api: &ApiArgs,
) -> CliResult<()> {
    let client = api.client()?;
    let extraction = extract(input, args)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let summary = runtime.block_on(client.summarize(extraction.text()))?;

    println!("{}", summary);

    if let Some(path) = pdf {
        match pagetext::render_summary_pdf(&summary, title, path) {
            Ok(()) => eprintln!("{} {}", "Saved to".green(), path.display()),
            Err(e) => eprintln!("{}: summary PDF not written: {}", "warning".yellow(), e),
        }
    }

    Ok(())
}

fn cmd_ask(message: &str, api: &ApiArgs) -> CliResult<()> {
    if message.trim().is_empty() {
        return Err("message must not be empty".into());
    }
    let client = api.client()?;
    let runtime = tokio::runtime::Runtime::new()?;
    let answer = runtime.block_on(client.answer(message))?;
    println!("{}", answer);
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagetext".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF text extraction with OCR fallback");
    println!();
    println!("OCR: {}", "tesseract".dimmed());
    println!("Rasterizer: {}", "pdftoppm".dimmed());
    println!("License: MIT");
}
