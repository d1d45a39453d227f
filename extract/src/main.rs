use std::io::{prelude::*, stdin, stdout, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use seqtag::{default_pos_analyzer, Sequence};

#[derive(Parser, Debug)]
#[command(about = "A program to extract feature vectors with frozen mappings.")]
struct Args {
    /// The directory holding the feature and label mappings
    #[arg(long)]
    mapping_dir: PathBuf,
}

fn percent(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        100.0 * part / total
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    log::info!("Loading mappings...");
    let mut analyzer = default_pos_analyzer();
    analyzer.load(&args.mapping_dir)?;
    let oov = analyzer.feature_map().oov_id();
    let unknown_label = analyzer.num_labels() as u64;

    log::info!("Start extraction");
    let mut out = BufWriter::new(stdout().lock());
    let mut n_positions = 0;
    let mut n_features = 0;
    let mut feature_weight = 0.0;
    let mut oov_weight = 0.0;
    let mut n_oov_positions = 0;
    let mut n_unknown_labels = 0;
    let start = Instant::now();
    for line in stdin().lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let mut s = Sequence::from_tagged(&line)?;
        analyzer.analyze_readonly(&mut s);
        for obs in &s {
            let label = obs.label().map_or(unknown_label, |l| l.0);
            if label == unknown_label {
                n_unknown_labels += 1;
            }
            if let Some(w) = obs.features().get(oov) {
                oov_weight += w;
                n_oov_positions += 1;
            }
            n_features += obs.features().len();
            write!(out, "{}\t{}\t", obs.symbol(), label)?;
            for (i, (id, weight)) in obs.features().iter().enumerate() {
                if i != 0 {
                    write!(out, " ")?;
                }
                write!(out, "{id}:{weight}")?;
                feature_weight += weight;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
        n_positions += s.len();
    }
    out.flush()?;

    let duration = start.elapsed();
    log::info!("Elapsed: {} [sec]", duration.as_secs_f64());
    log::info!(
        "Unseen features: {:.2}% of emitted features, {:.2}% of positions",
        percent(oov_weight, feature_weight),
        percent(n_oov_positions as f64, n_positions as f64),
    );
    log::info!(
        "Unknown labels: {:.2}% of positions",
        percent(n_unknown_labels as f64, n_positions as f64),
    );
    log::info!(
        "Speed: {} [features/sec]",
        n_features as f64 / duration.as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(25.0, percent(1.0, 4.0));
        assert_eq!(0.0, percent(0.0, 0.0));
    }
}
