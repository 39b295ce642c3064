//! CLI binary for whitepaper-factory.
//!
//! A thin shim over the library: flags map onto `WizardConfig`, each
//! subcommand calls one `Wizard` method and prints or writes the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use whitepaper_factory::{
    server, ComposeRequest, ExtractRequest, ExtractedData, RenderRequest, ReviewRequest,
    RunOptions, Wizard, WizardConfig,
};

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the HTTP service for the browser wizard
  whitepaper serve --bind 0.0.0.0:3000

  # Whole wizard in one go, with compliance review
  whitepaper run https://www.lindenhaeghe.nl/opleiding/bhv --review

  # Step by step
  whitepaper extract https://www.lindenhaeghe.nl/opleiding/bhv > facts.json
  whitepaper compose --facts facts.json --template product-deep-dive -o draft.md
  whitepaper review --markdown draft.md --facts facts.json
  whitepaper render --markdown draft.md --course-name "BHV Basis" -o bhv.pdf

TEMPLATES:
  lead-magnet          2 pages, ~600 words (default)
  product-deep-dive    4 pages, ~1200 words
  update-explainer     3 pages, ~900 words

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            OpenAI API key
  EDGEQUAKE_LLM_PROVIDER    Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL           Override model ID (default gpt-4o-mini)
  WHITEPAPER_EXTRACTOR_URL  Extraction service base URL (default http://127.0.0.1:8000)
  WHITEPAPER_BRAND          Organization name stripped from titles
  WHITEPAPER_TEMPLATE       HTML template path
  WHITEPAPER_LOGO           Cover logo path
  WHITEPAPER_BIND           Listen address for `serve`
  WHITEPAPER_CHROME         Chrome/Chromium executable
"#;

/// Turn course pages into reviewed, branded whitepaper PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "whitepaper",
    version,
    about = "Turn course pages into reviewed, branded whitepaper PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Extraction service base URL.
    #[arg(long, global = true, env = "WHITEPAPER_EXTRACTOR_URL")]
    extractor_url: Option<String>,

    /// LLM model ID.
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama.
    #[arg(long, global = true, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "WHITEPAPER_VERBOSE")]
    verbose: bool,

    /// Suppress everything except errors and the command's output.
    #[arg(short, long, global = true, env = "WHITEPAPER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service.
    Serve {
        /// Listen address.
        #[arg(long, env = "WHITEPAPER_BIND")]
        bind: Option<String>,
    },

    /// Extract course facts from a URL and print them as JSON.
    Extract { url: String },

    /// Draft a whitepaper from extracted facts.
    Compose {
        /// ExtractedData JSON file.
        #[arg(long)]
        facts: PathBuf,

        /// lead-magnet, product-deep-dive or update-explainer.
        #[arg(long, default_value = "lead-magnet")]
        template: String,

        /// nl or en.
        #[arg(long, default_value = "nl")]
        language: String,

        /// Also write the layout spec JSON to this file.
        #[arg(long)]
        layout: Option<PathBuf>,

        /// Write Markdown here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Critique a draft for unsupported claims, tone and improvements.
    Review {
        /// Draft Markdown file.
        #[arg(long)]
        markdown: PathBuf,

        /// ExtractedData JSON file to fact-check against.
        #[arg(long)]
        facts: Option<PathBuf>,
    },

    /// Render a draft to PDF.
    Render {
        /// Draft Markdown file.
        #[arg(long)]
        markdown: PathBuf,

        /// Cover title; the draft's first line is used when absent.
        #[arg(long)]
        course_name: Option<String>,

        /// Template id, shown on the cover.
        #[arg(long)]
        template: Option<String>,

        /// nl or en.
        #[arg(long, default_value = "nl")]
        language: String,

        /// Output file. Defaults to the suggested name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract, compose, optionally review, and render in one go.
    Run {
        url: String,

        #[arg(long, default_value = "lead-magnet")]
        template: String,

        #[arg(long, default_value = "nl")]
        language: String,

        /// Run the compliance review and print its report.
        #[arg(long)]
        review: bool,

        /// Directory for the PDF (and the draft Markdown).
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // One-shot commands show a spinner; keep INFO logs for `serve` only.
    let serving = matches!(cli.command, Command::Serve { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if serving {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let wizard = Wizard::from_config(config).context("Failed to initialise the wizard")?;
    let quiet = cli.quiet;

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| wizard.config().bind_addr.clone());
            server::serve(Arc::new(wizard), &addr)
                .await
                .with_context(|| format!("HTTP server on {addr} stopped"))?;
        }

        Command::Extract { url } => {
            let data = with_spinner(quiet, "Extracting course facts…", async {
                wizard.extract(&ExtractRequest::for_url(url)).await
            })
            .await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }

        Command::Compose {
            facts,
            template,
            language,
            layout,
            output,
        } => {
            let data = read_facts(&facts)?;
            let req = ComposeRequest {
                extracted_data: Some(data),
                template_type: Some(template),
                language: Some(language),
            };
            let draft = with_spinner(quiet, "Drafting whitepaper…", wizard.compose(&req)).await?;
            if !draft.title_matches && !quiet {
                eprintln!("{} first line differs from the requested cover title", yellow("warning:"));
            }
            if let Some(path) = layout {
                std::fs::write(&path, serde_json::to_string_pretty(&draft.layout_spec)?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            write_or_print(output.as_deref(), &draft.markdown, quiet)?;
        }

        Command::Review { markdown, facts } => {
            let markdown = read_text(&markdown)?;
            let extracted_json = match facts {
                Some(path) => Some(serde_json::Value::String(read_text(&path)?)),
                None => None,
            };
            let req = ReviewRequest {
                markdown,
                extracted_json,
            };
            let report = with_spinner(quiet, "Reviewing draft…", wizard.review(&req)).await?;
            println!("{}", report.report);
        }

        Command::Render {
            markdown,
            course_name,
            template,
            language,
            output,
        } => {
            let req = RenderRequest {
                markdown: read_text(&markdown)?,
                course_name,
                title: None,
                template_type: template,
                language: Some(language),
            };
            let path = match output {
                Some(path) => {
                    let pdf = with_spinner(quiet, "Printing PDF…", wizard.render(&req)).await?;
                    std::fs::write(&path, &pdf.bytes)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    path
                }
                None => {
                    with_spinner(quiet, "Printing PDF…", wizard.render_to_dir(&req, ".")).await?
                }
            };
            if !quiet {
                eprintln!("{} {}", green("✓"), bold(&path.display().to_string()));
            }
        }

        Command::Run {
            url,
            template,
            language,
            review,
            out_dir,
        } => {
            let opts = RunOptions {
                template_type: Some(template),
                language: Some(language),
                review,
            };
            let out = with_spinner(quiet, "Running the wizard…", wizard.run(&url, &opts)).await?;

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            let pdf_path = out_dir.join(&out.pdf.filename);
            std::fs::write(&pdf_path, &out.pdf.bytes)
                .with_context(|| format!("Failed to write {}", pdf_path.display()))?;
            let md_path = pdf_path.with_extension("md");
            std::fs::write(&md_path, &out.draft.markdown)
                .with_context(|| format!("Failed to write {}", md_path.display()))?;

            if let Some(report) = out.review {
                println!("{}", report.report);
            }
            if !quiet {
                if !out.draft.title_matches {
                    eprintln!("{} first line differs from the requested cover title", yellow("warning:"));
                }
                eprintln!(
                    "{} {} {}",
                    green("✓"),
                    bold(&pdf_path.display().to_string()),
                    dim(&format!("({} bytes, draft in {})", out.pdf.bytes.len(), md_path.display()))
                );
            }
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<WizardConfig> {
    let mut builder = WizardConfig::from_env()
        .context("Invalid environment configuration")?
        .into_builder();
    if let Some(ref url) = cli.extractor_url {
        builder = builder.extractor_url(url.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    builder.build().context("Invalid configuration")
}

async fn with_spinner<F: Future>(quiet: bool, message: &'static str, fut: F) -> F::Output {
    if quiet {
        return fut.await;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    let out = fut.await;
    bar.finish_and_clear();
    out
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_facts(path: &Path) -> Result<ExtractedData> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("{} is not extracted course data", path.display()))
}

fn write_or_print(output: Option<&Path>, text: &str, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !quiet {
                eprintln!("{} {}", green("✓"), bold(&path.display().to_string()));
            }
        }
        None => println!("{text}"),
    }
    Ok(())
}
