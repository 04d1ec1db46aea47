use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "proofchunk",
    version,
    about = "Arabic PDF proofreading chunk preparation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Chunk(ChunkArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    pub pdf_path: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,

    #[arg(long, default_value_t = 25000)]
    pub max_words: usize,

    #[arg(long, default_value_t = 80)]
    pub max_pages: usize,

    #[arg(long, default_value = "ara+eng")]
    pub ocr_lang: String,

    #[arg(long, default_value_t = 40)]
    pub min_text_chars: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,
}
