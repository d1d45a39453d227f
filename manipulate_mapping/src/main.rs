use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use seqtag::{Compression, SequenceAnalyzer};

#[derive(Parser, Debug)]
#[command(about = "A program to inspect and convert mapping directories.")]
struct Args {
    /// The directory holding the feature and label mappings
    #[arg(long)]
    mapping_dir: PathBuf,

    /// Output the feature mapping as `feature,id` CSV
    #[arg(long)]
    dump_features: Option<PathBuf>,

    /// Output the label mapping as `tag,label` CSV
    #[arg(long)]
    dump_labels: Option<PathBuf>,

    /// Save the mappings again to this directory
    #[arg(long)]
    mapping_out: Option<PathBuf>,

    /// Store the feature mapping uncompressed when saving with --mapping-out
    #[arg(long)]
    no_compress: bool,
}

#[derive(Serialize)]
struct FeatureRecord<'a> {
    feature: &'a str,
    id: u64,
}

#[derive(Serialize)]
struct LabelRecord<'a> {
    tag: &'a str,
    label: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    log::info!("Loading mappings...");
    let mut analyzer = SequenceAnalyzer::from_prefix(&args.mapping_dir)?;
    log::info!(
        "# of features: {}, # of labels: {}",
        analyzer.num_features(),
        analyzer.num_labels()
    );

    if let Some(path) = args.dump_features {
        log::info!("Saving feature mapping to {path:?} ...");
        let mut wtr = csv::Writer::from_writer(fs::File::create(path)?);
        for (feature, id) in analyzer.feature_map().iter() {
            wtr.serialize(FeatureRecord { feature, id: id.0 })?;
        }
        wtr.flush()?;
    }

    if let Some(path) = args.dump_labels {
        log::info!("Saving label mapping to {path:?} ...");
        let mut wtr = csv::Writer::from_writer(fs::File::create(path)?);
        for (tag, label) in analyzer.labels().iter() {
            wtr.serialize(LabelRecord { tag, label: label.0 })?;
        }
        wtr.flush()?;
    }

    if let Some(path) = args.mapping_out {
        if args.no_compress {
            analyzer = analyzer.compression(Compression::None);
        }
        analyzer.save(path)?;
    }

    Ok(())
}
