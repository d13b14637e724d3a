//! ORE CLI - Command-line interface
//!
//! Usage:
//!   ore extract [path]
//!   ore evaluate <labeled-path>
//!   ore check-pattern <pattern>
//!   ore stages

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ore_core::{AppConfig, LoggingConfig, OutputFormat};
use ore_extractor::{
    Evaluator, Extractor, ExtractorBuilder, LabeledReader, LinearConfidence, OutputWriter,
    RelationFirstExtractor, SentenceReader,
};
use ore_pattern::Pattern;

#[derive(Parser)]
#[command(name = "ore")]
#[command(about = "Open relation extraction over tagged sentences")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract binary relations from sentence blocks
    Extract {
        /// Blank-line separated token / POS / chunk blocks; stdin when absent or `-`
        path: Option<PathBuf>,

        /// Output format (tsv or json)
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Append the sentence to every row
        #[arg(long)]
        include_sentence: bool,

        /// Emit extractions with a single argument
        #[arg(long)]
        allow_unary: bool,

        /// Linear confidence model (JSON or TOML)
        #[arg(long)]
        confidence_model: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the extractor against labeled extractions
    Evaluate {
        /// Labeled interchange file
        path: PathBuf,

        /// Match spans exactly instead of by text
        #[arg(long)]
        strict: bool,

        /// Linear confidence model used to rank predictions
        #[arg(long)]
        confidence_model: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compile a pattern and report syntax errors
    CheckPattern {
        pattern: String,
    },
    /// List pipeline stage names
    Stages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract {
            path,
            format,
            include_sentence,
            allow_unary,
            confidence_model,
            output,
        } => {
            let mut config = config;
            if let Some(format) = format {
                config.output.format = format;
            }
            config.output.include_sentence |= include_sentence;
            config.extractor.allow_unary |= allow_unary;

            let extractor = build_extractor(&config, confidence_model.as_deref())?;
            let input = open_input(path.as_deref())?;
            let sink: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path).with_context(|| format!("creating {}", path.display()))?,
                )),
                None => Box::new(BufWriter::new(io::stdout().lock())),
            };
            extract(&extractor, input, OutputWriter::new(sink, &config.output))?;
        }
        Commands::Evaluate {
            path,
            strict,
            confidence_model,
            json,
        } => {
            let extractor = build_extractor(&config, confidence_model.as_deref())?;
            let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
            let records: Vec<_> = LabeledReader::new(BufReader::new(file)).collect();
            tracing::info!(records = records.len(), "loaded labeled extractions");

            let evaluator = if strict {
                Evaluator::new().strict()
            } else {
                Evaluator::new()
            };
            let report = evaluator.evaluate_extractor(&extractor, &records)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let m = &report.metrics;
                println!("sentences:  {}", report.sentences);
                println!("gold:       {}", m.gold_total);
                println!("predicted:  {}", m.predicted_total);
                println!("correct:    {}", m.true_positives);
                println!("precision:  {:.4}", m.precision());
                println!("recall:     {:.4}", m.recall());
                println!("f1:         {:.4}", m.f1_score());
                println!("avg prec:   {:.4}", report.average_precision());
            }
        }
        Commands::CheckPattern { pattern } => {
            let compiled = Pattern::compile(&pattern).context("invalid pattern")?;
            println!(
                "ok: {} group(s), layers: {}",
                compiled.group_count(),
                compiled.layers().join(", ")
            );
        }
        Commands::Stages => {
            let extractor = build_extractor(&config, None)?;
            for stage in extractor.stage_names() {
                println!("{stage}");
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path).with_context(|| match path {
        Some(path) => format!("loading config {}", path.display()),
        None => "reading configuration from environment".to_string(),
    })
}

fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);
    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_extractor(config: &AppConfig, model: Option<&Path>) -> Result<RelationFirstExtractor> {
    let mut builder = ExtractorBuilder::new(config.extractor.clone());
    if let Some(path) = model {
        let model = LinearConfidence::from_path(path)
            .with_context(|| format!("loading confidence model {}", path.display()))?;
        tracing::info!(features = model.len(), "loaded confidence model");
        builder = builder.with_confidence(model);
    }
    builder.build().context("building extractor")
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn extract<W: Write>(
    extractor: &RelationFirstExtractor,
    input: impl BufRead,
    mut writer: OutputWriter<W>,
) -> Result<()> {
    let mut sentences = 0usize;
    for (index, sentence) in SentenceReader::new(input) {
        sentences += 1;
        match extractor.extract(&sentence) {
            Ok(extractions) => {
                for extraction in extractions {
                    writer.write(index, &extraction)?;
                }
            }
            Err(e) => tracing::warn!(sentence = index, error = %e, "extraction failed, skipping"),
        }
    }
    writer.flush()?;
    tracing::info!(sentences, extractions = writer.written(), "extraction finished");
    Ok(())
}
