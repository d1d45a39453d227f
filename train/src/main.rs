use std::fs::File;
use std::io::{prelude::*, BufReader};
use std::path::PathBuf;

use clap::Parser;
use seqtag::{default_pos_analyzer, Compression, Sequence};

#[derive(Parser, Debug)]
#[command(about = "A program to build feature and label mappings from tagged corpora.")]
struct Args {
    /// A tagged training corpus, one `word/TAG` sequence per line
    #[arg(long, required = true)]
    tagged: Vec<PathBuf>,

    /// The directory to write the mappings to
    #[arg(long)]
    mapping_dir: PathBuf,

    /// A directory holding mappings to extend instead of starting from empty ones
    #[arg(long)]
    init_mapping: Option<PathBuf>,

    /// Store the feature mapping uncompressed
    #[arg(long)]
    no_compress: bool,

    /// The gzip compression level for the feature mapping
    #[arg(long, default_value = "6", value_parser = clap::value_parser!(u32).range(0..=9))]
    gzip_level: u32,

    /// Store the feature mapping with zstd at this level instead of gzip
    #[arg(long, conflicts_with = "no_compress")]
    zstd_level: Option<i32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let compression = match (args.no_compress, args.zstd_level) {
        (true, _) => Compression::None,
        (false, Some(level)) => Compression::Zstd(level),
        (false, None) => Compression::Gzip(args.gzip_level),
    };
    let mut analyzer = default_pos_analyzer().compression(compression);
    if let Some(path) = &args.init_mapping {
        log::info!("Loading initial mappings from {path:?} ...");
        analyzer.load(path)?;
    }

    let mut n_sequences = 0;
    let mut n_positions = 0;
    for path in &args.tagged {
        log::info!("Loading {path:?} ...");
        let f = BufReader::new(File::open(path)?);
        for (i, line) in f.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut s = Sequence::from_tagged(&line)
                .map_err(|e| format!("{}:{}: {e}", path.display(), i + 1))?;
            analyzer.analyze(&mut s)?;
            n_sequences += 1;
            n_positions += s.len();
            if n_sequences % 10000 == 0 {
                eprint!(
                    "# of sequences: {n_sequences}, # of features: {}\r",
                    analyzer.num_features()
                );
            }
        }
    }
    log::info!(
        "# of sequences: {n_sequences}, # of positions: {n_positions}, # of features: {}, # of labels: {}",
        analyzer.num_features(),
        analyzer.num_labels(),
    );

    analyzer.save(&args.mapping_dir)?;

    Ok(())
}
