use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use env_logger::Builder;
use log::{info, LevelFilter};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_pcg::Pcg64;

const VOCABULARY: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on", "with", "he", "as", "you",
    "do", "at", "this", "but", "his", "by", "from", "they", "we", "say", "her", "she", "or", "an", "will", "my", "one",
    "all", "would", "there", "their", "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me",
    "when", "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into", "year", "your",
    "good", "some", "could", "them", "see", "other", "than", "then", "now", "look", "only", "come", "its", "over",
    "think", "also", "back", "after", "use", "two", "how", "our", "work", "first", "well", "way", "even", "new",
    "want", "because", "any", "these", "give", "day", "most", "us", "hadoop", "mapreduce", "data", "processing",
    "cluster", "node", "compute", "storage", "distributed", "system", "task", "job", "reduce", "map", "parallel",
    "scale", "performance", "throughput", "latency", "network", "disk",
];

const NUMBERED_WORDS: usize = 10000;

/// Word which takes the configured share of a skewed data set.
const HOTKEY: &str = "hotkey";

const PROGRESS_STEP: u64 = 100 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Vocabulary {
    /// Common English words and a few domain terms.
    Common,
    /// `word00000` to `word09999`.
    Numbered,
}

/// Draws words of generated text.
struct Words {
    vocabulary: Vec<String>,
    hotkey_ratio: f64,
}

impl Words {
    fn new(vocabulary: Vocabulary, hotkey_ratio: f64) -> Self {
        let vocabulary = match vocabulary {
            Vocabulary::Common => VOCABULARY.iter().map(|w| w.to_string()).collect(),
            Vocabulary::Numbered => (0..NUMBERED_WORDS).map(|i| format!("word{:05}", i)).collect(),
        };
        Words {
            vocabulary,
            hotkey_ratio,
        }
    }

    fn next<'a, R: Rng>(&'a self, rng: &mut R) -> &'a str {
        if self.hotkey_ratio > 0. && rng.gen_bool(self.hotkey_ratio) {
            return HOTKEY;
        }
        self.vocabulary.choose(rng).map(String::as_str).unwrap_or(HOTKEY)
    }
}

/// Generates a text file of random words for word count runs.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the generated file.
    #[arg(short, long)]
    output: PathBuf,

    /// Target size, e.g. 500MB, 1GB or 1500MB. Units are powers of 1024.
    #[arg(short, long)]
    size: String,

    /// Number of words in each line.
    #[arg(long, default_value_t = 10)]
    words_per_line: usize,

    /// Seed of the random generator.
    #[arg(long, default_value_t = 123)]
    seed: u64,

    /// Words to draw from.
    #[arg(long, value_enum, default_value_t = Vocabulary::Common)]
    vocabulary: Vocabulary,

    /// Make one hot key take a share of all words.
    #[arg(long)]
    skew: bool,

    /// Share of the hot key among all words, used with --skew.
    #[arg(long, default_value_t = 0.6)]
    hotkey_ratio: f64,
}

/// Parses sizes like `500MB`, `1.5GB` or `4096`.
fn parse_size(size: &str) -> anyhow::Result<u64> {
    let size = size.trim();
    let split = size.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    let multiplier: u64 = match unit.to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1 << 10,
        "MB" | "M" => 1 << 20,
        "GB" | "G" => 1 << 30,
        "TB" | "T" => 1 << 40,
        other => bail!("unknown size unit {:?}", other),
    };
    let number: f64 = number.trim().parse().with_context(|| format!("invalid size {:?}", size))?;
    if !number.is_finite() || number < 0. {
        bail!("invalid size {:?}", size);
    }
    Ok((number * multiplier as f64) as u64)
}

fn main() -> anyhow::Result<()> {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let target = parse_size(&args.size)?;
    if args.skew && !(0.0..=1.0).contains(&args.hotkey_ratio) {
        bail!("hot key ratio must be within [0, 1], got {}", args.hotkey_ratio);
    }
    let words = Words::new(args.vocabulary, if args.skew { args.hotkey_ratio } else { 0. });
    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Can't create directory {}", parent.display()))?;
    }
    let file = File::create(&args.output).with_context(|| format!("Can't create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    let mut rng = Pcg64::seed_from_u64(args.seed);

    info!("Generating {} bytes of text into {}", target, args.output.display());
    if args.skew {
        info!("Hot key {:?} takes {:.0}% of words", HOTKEY, args.hotkey_ratio * 100.);
    }
    let mut written = 0u64;
    let mut line = String::new();
    while written < target {
        line.clear();
        for i in 0..args.words_per_line {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(words.next(&mut rng));
        }
        line.push('\n');
        writer.write_all(line.as_bytes())?;

        let before = written;
        written += line.len() as u64;
        if written / PROGRESS_STEP != before / PROGRESS_STEP {
            info!("Progress: {:.1}%", written as f64 * 100. / target as f64);
        }
    }
    writer.flush()?;
    info!("Done, written {} bytes ({:.1}MB)", written, written as f64 / (1 << 20) as f64);
    Ok(())
}
