#![cfg_attr(docsrs, feature(doc_cfg))]

//! # seqtag
//!
//! seqtag turns tokenized sequences into feature-id and label-id vectors for statistical
//! sequence labeling models such as part-of-speech taggers.
//!
//! A [`SequenceAnalyzer`] owns two growable mappings (feature names to feature ids, tags to
//! label ids) and a pipeline of observation functions. In training mode the mappings grow as
//! new names and tags are observed; in inference mode they stay frozen and unseen names
//! resolve to an out-of-vocabulary id equal to the mapping size.
//!
//! ## Examples
//!
//! ```no_run
//! use std::io::{prelude::*, stdin};
//!
//! use seqtag::{default_pos_analyzer, Sequence};
//!
//! let mut analyzer = default_pos_analyzer();
//! analyzer.load("mapping").unwrap();
//!
//! for line in stdin().lock().lines() {
//!     let mut s = Sequence::from_tagged(line.unwrap()).unwrap();
//!     analyzer.analyze_readonly(&mut s);
//!     for obs in &s {
//!         println!("{} {:?}", obs.symbol(), obs.label());
//!     }
//! }
//! ```

mod analyzer;
mod collector;
mod feature_map;
mod ids;
mod observation;
mod progress;
mod sequence;
mod utils;

pub mod errors;
pub mod mapping;

pub use analyzer::SequenceAnalyzer;
pub use collector::{Collector, MutatingCollector, ReadOnlyCollector};
pub use feature_map::{Compression, FeatureMap};
pub use ids::{FeatureId, LabelId};
pub use mapping::BiMap;
pub use observation::{
    bias, current_word_features, default_pos_analyzer, fold_case, next_word_features,
    previous_word_features, ObservationFn,
};
pub use sequence::{FeatureVector, Observation, Sequence};
