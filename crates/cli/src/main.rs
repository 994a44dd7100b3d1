//! `deplm`: build, score, search and sample a dependency-grammar LM.
//!
//! Subcommands:
//!   init     read training text, build the vocabulary, write fresh parameters
//!   loss     per-sentence negative log-likelihood of a text
//!   dump     per-token diagnostics for a text
//!   predict  beam search for the k best sentences
//!   sample   draw sentences from the model
//!
//! Results go to stdout; logs go to stderr (`RUST_LOG`, default `info`).

mod model_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deplm_core::{DependencyOutputModel, DependencyParams, ModelConfig};
use deplm_nlp::{read_text, Sentence, Vocab};
use deplm_search::{
    beam_search, diagnose, format_diagnostic, format_kbest, format_loss, format_sample,
    sample_sentence, sentence_loss, BeamConfig,
};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::model_file::ModelFile;

#[derive(Parser, Debug)]
#[command(name = "deplm", about = "Neural dependency-grammar language model")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a vocabulary from training text and write an untrained model
    Init {
        /// Training text, one sentence per line
        train_text: PathBuf,
        /// Where to write the model
        #[arg(short, long)]
        out: PathBuf,
        /// Width of word embeddings
        #[arg(long, default_value_t = 64)]
        embedding_dim: usize,
        /// Width of decoder states (even)
        #[arg(long, default_value_t = 64)]
        state_dim: usize,
        /// Width of the scorer's hidden layer
        #[arg(short = 'H', long, default_value_t = 64)]
        hidden_dim: usize,
        /// GRU layers per encoder
        #[arg(long, default_value_t = 2)]
        layers: usize,
        /// Seed for parameter initialisation
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Token that unseen words map to
        #[arg(long, default_value = "UNK")]
        unk: String,
    },
    /// Print the loss of every sentence in a text
    Loss {
        model: PathBuf,
        text: PathBuf,
    },
    /// Print how the model ranks every token of a text
    Dump {
        model: PathBuf,
        text: PathBuf,
    },
    /// Beam search for the best sentences
    Predict {
        model: PathBuf,
        /// K-best list size
        #[arg(short, long, default_value_t = 1)]
        kbest_size: usize,
        /// Beam size
        #[arg(short, long, default_value_t = 10)]
        beam_size: usize,
        /// Maximum length of output sentences
        #[arg(long, default_value_t = 100)]
        max_length: usize,
        /// Length bonus per word
        #[arg(long, default_value_t = 0.0)]
        length_bonus: f64,
    },
    /// Draw random sentences
    Sample {
        model: PathBuf,
        /// Maximum length of output sentences
        #[arg(long, default_value_t = 300)]
        max_length: usize,
        /// Number of sentences to draw
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        /// Sampling seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Cmd::Init {
            train_text,
            out,
            embedding_dim,
            state_dim,
            hidden_dim,
            layers,
            seed,
            unk,
        } => {
            let config = ModelConfig {
                embedding_dim,
                state_dim,
                hidden_dim,
                layers,
                seed,
            };
            cmd_init(&train_text, &out, config, &unk)
        }
        Cmd::Loss { model, text } => cmd_loss(&model, &text),
        Cmd::Dump { model, text } => cmd_dump(&model, &text),
        Cmd::Predict {
            model,
            kbest_size,
            beam_size,
            max_length,
            length_bonus,
        } => {
            let beam = BeamConfig {
                kbest_size,
                beam_size,
                max_length,
                length_bonus,
            };
            cmd_predict(&model, &beam)
        }
        Cmd::Sample {
            model,
            max_length,
            count,
            seed,
        } => cmd_sample(&model, max_length, count, seed),
    }
}

/// Read a text, keeping good lines and logging the rest.
fn read_sentences(path: &Path, vocab: &mut Vocab) -> Result<Vec<Sentence>> {
    let lines = read_text(path, vocab)?;
    let total = lines.len();
    let sentences: Vec<Sentence> = lines
        .into_iter()
        .filter_map(|line| match line {
            Ok(sentence) => Some(sentence),
            Err(e) => {
                warn!("{}: skipping {}", path.display(), e);
                None
            }
        })
        .collect();
    info!("Read {} of {} sentences from {}", sentences.len(), total, path.display());
    Ok(sentences)
}

fn open_decoder(file: &ModelFile) -> Result<DependencyOutputModel> {
    let params = Arc::new(file.params.clone());
    DependencyOutputModel::new(params).context("Failed to build decoder")
}

fn cmd_init(train_text: &Path, out: &Path, config: ModelConfig, unk: &str) -> Result<()> {
    let mut vocab = Vocab::with_control_tokens();
    let sentences = read_sentences(train_text, &mut vocab)?;
    if sentences.is_empty() {
        bail!("{} has no usable sentences", train_text.display());
    }
    vocab.set_unk(unk);
    vocab.freeze();

    let params = DependencyParams::new(config, &vocab).context("Failed to build model")?;
    info!("Vocabulary size: {}", vocab.len());
    info!("Total parameters: {}", params.parameter_count());

    ModelFile { vocab, params }.save(out)?;
    info!("Wrote {}", out.display());
    Ok(())
}

fn cmd_loss(model_path: &Path, text: &Path) -> Result<()> {
    let mut file = ModelFile::load(model_path)?;
    let sentences = read_sentences(text, &mut file.vocab)?;
    let mut model = open_decoder(&file)?;

    let mut total = 0.0;
    let mut words = 0;
    for (i, sentence) in sentences.iter().enumerate() {
        match sentence_loss(&mut model, sentence) {
            Ok(loss) => {
                println!("{}", format_loss(i, loss));
                total += loss;
                words += sentence.len();
            }
            Err(e) => warn!("Sentence {}: {}", i, e),
        }
    }
    if words > 0 {
        info!(
            "Total loss {:.4} over {} words (perplexity {:.4})",
            total,
            words,
            (total / words as f64).exp()
        );
    }
    Ok(())
}

fn cmd_dump(model_path: &Path, text: &Path) -> Result<()> {
    let mut file = ModelFile::load(model_path)?;
    let sentences = read_sentences(text, &mut file.vocab)?;
    let mut model = open_decoder(&file)?;

    for (i, sentence) in sentences.iter().enumerate() {
        match diagnose(&mut model, sentence) {
            Ok(report) => {
                println!("# sentence {}", i);
                for token in &report {
                    println!("{}", format_diagnostic(token, &file.vocab)?);
                }
            }
            Err(e) => warn!("Sentence {}: {}", i, e),
        }
    }
    Ok(())
}

fn cmd_predict(model_path: &Path, beam: &BeamConfig) -> Result<()> {
    let file = ModelFile::load(model_path)?;
    let mut model = open_decoder(&file)?;
    let kbest = beam_search(&mut model, beam).context("Beam search failed")?;
    for line in format_kbest(0, &kbest, &file.vocab)? {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_sample(model_path: &Path, max_length: usize, count: usize, seed: u64) -> Result<()> {
    let file = ModelFile::load(model_path)?;
    let mut model = open_decoder(&file)?;
    let mut rng = StdRng::seed_from_u64(seed);

    for i in 0..count {
        match sample_sentence(&mut model, max_length, &mut rng) {
            Ok(sample) => println!("{}", format_sample(&sample, &file.vocab)?),
            Err(e) => warn!("Sample {}: {}", i, e),
        }
    }
    Ok(())
}
