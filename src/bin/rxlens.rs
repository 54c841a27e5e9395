use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rxlens::pipeline::layout::{parse_tsv_words, LayoutFusion, RegionTexts};
use rxlens::pipeline_config::AnalyzerConfig;

#[derive(Parser)]
#[command(name = "rxlens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Structure OCR output of medical prescriptions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse recognized region text into medications and instructions
    Analyze {
        /// JSON object keyed by region: header, patient_info, prescription_area, footer
        #[arg(long)]
        input: PathBuf,

        /// Tesseract TSV of the prescription area, one file per OCR variant
        #[arg(long = "words")]
        words: Vec<PathBuf>,

        /// Analyzer configuration JSON; defaults apply to missing keys
        #[arg(long, env = "RXLENS_CONFIG")]
        config: Option<PathBuf>,

        /// Pretty-print the result
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the default analyzer configuration
    Defaults,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    rxlens::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            words,
            config,
            pretty,
        } => {
            let config = match config {
                Some(path) => AnalyzerConfig::from_json_file(&path)?,
                None => AnalyzerConfig::default(),
            };

            let texts: RegionTexts = serde_json::from_str(&std::fs::read_to_string(&input)?)?;

            let mut word_lists = Vec::with_capacity(words.len());
            for path in &words {
                let parsed = parse_tsv_words(&std::fs::read_to_string(path)?);
                tracing::debug!(file = %path.display(), words = parsed.len(), "Loaded word list");
                word_lists.push(parsed);
            }

            let result = LayoutFusion::new(config).analyze_texts(&texts, &word_lists);

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");
        }
        Commands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&AnalyzerConfig::default())?);
        }
    }

    Ok(())
}
