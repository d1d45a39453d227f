use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::collector::{Collector, MutatingCollector, ReadOnlyCollector};
use crate::errors::{Result, SeqTagError};
use crate::feature_map::{Compression, FeatureMap};
use crate::ids::{FeatureId, LabelId};
use crate::mapping::{self, BiMap};
use crate::observation::ObservationFn;
use crate::sequence::{FeatureVector, Sequence};

const FEATURE_MAPPING_FILE: &str = "feature.mapping";
#[cfg(feature = "compress")]
const GZIP_FEATURE_MAPPING_FILE: &str = "feature.mapping.gz";
#[cfg(feature = "compress")]
const ZSTD_FEATURE_MAPPING_FILE: &str = "feature.mapping.zst";
const LABEL_MAPPING_FILE: &str = "label.mapping";

fn feature_mapping_files() -> Vec<&'static str> {
    let mut files = vec![FEATURE_MAPPING_FILE];
    #[cfg(feature = "compress")]
    files.extend([GZIP_FEATURE_MAPPING_FILE, ZSTD_FEATURE_MAPPING_FILE]);
    files
}

fn observe(obs_fns: &[ObservationFn], seq: &Sequence, t: usize, coll: &mut dyn Collector) {
    for f in obs_fns {
        f(seq, t, &mut *coll);
    }
}

/// Sequence analyzer.
///
/// Owns the feature mapping and the label mapping, and runs a pipeline of observation
/// functions over every position of a sequence.
///
/// Training ([`analyze()`](Self::analyze)) takes `&mut self` and grows both mappings.
/// Inference ([`analyze_readonly()`](Self::analyze_readonly)) takes `&self` and leaves them
/// frozen, so an analyzer may be shared between threads for inference. Training from several
/// threads requires external synchronization.
///
/// # Examples
///
/// ```no_run
/// use seqtag::{default_pos_analyzer, Sequence};
///
/// let mut analyzer = default_pos_analyzer();
/// let mut s = Sequence::from_tagged("The/DT dog/NN barks/VBZ").unwrap();
/// analyzer.analyze(&mut s).unwrap();
/// analyzer.save("mapping").unwrap();
///
/// let mut analyzer = default_pos_analyzer();
/// analyzer.load("mapping").unwrap();
/// let mut s = Sequence::from_tagged("The cat barks").unwrap();
/// analyzer.analyze_readonly(&mut s);
/// ```
pub struct SequenceAnalyzer {
    feature_map: FeatureMap,
    label_map: BiMap<String, LabelId>,
    obs_fns: Vec<ObservationFn>,
    compression: Compression,
}

impl Default for SequenceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SequenceAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SequenceAnalyzer")
            .field("num_features", &self.feature_map.len())
            .field("num_labels", &self.label_map.len())
            .field("n_observation_functions", &self.obs_fns.len())
            .field("compression", &self.compression)
            .finish()
    }
}

impl SequenceAnalyzer {
    /// Creates an analyzer with empty mappings and an empty pipeline.
    pub fn new() -> Self {
        Self {
            feature_map: FeatureMap::new(),
            label_map: BiMap::new(),
            obs_fns: vec![],
            compression: Compression::default(),
        }
    }

    /// Creates an analyzer with an empty pipeline and the mappings stored under `prefix`.
    ///
    /// # Errors
    ///
    /// See [`load()`](Self::load).
    pub fn from_prefix<P>(prefix: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let mut analyzer = Self::new();
        analyzer.load(prefix)?;
        Ok(analyzer)
    }

    /// Sets the compression used by [`save()`](Self::save) for the feature mapping.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Appends an observation function to the pipeline.
    pub fn add_observation_function<F>(&mut self, f: F)
    where
        F: Fn(&Sequence, usize, &mut dyn Collector) + Send + Sync + 'static,
    {
        self.obs_fns.push(Box::new(f));
    }

    pub fn n_observation_functions(&self) -> usize {
        self.obs_fns.len()
    }

    /// Replaces both mappings with the ones stored under `prefix`.
    ///
    /// With the `compress` feature enabled, the feature mapping is read from
    /// `feature.mapping.gz` or `feature.mapping.zst` if one of them exists, in that order.
    /// Otherwise it is read from `feature.mapping`. The label mapping is
    /// read from `label.mapping`. The analyzer is only modified if both mappings were read.
    ///
    /// # Errors
    ///
    /// A missing-mapping error is returned when a mapping file is absent or cannot be opened,
    /// the feature mapping being checked first. Malformed files yield the corresponding
    /// decoding error.
    pub fn load<P>(&mut self, prefix: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let prefix = prefix.as_ref();
        let feature_map = Self::load_feature_map(prefix)?;
        let label_map = Self::load_label_map(prefix)?;
        log::info!(
            "Loaded {} features and {} labels from {}",
            feature_map.len(),
            label_map.len(),
            prefix.display()
        );
        self.feature_map = feature_map;
        self.label_map = label_map;
        Ok(())
    }

    fn load_feature_map(prefix: &Path) -> Result<FeatureMap> {
        #[cfg(feature = "compress")]
        {
            let path = prefix.join(GZIP_FEATURE_MAPPING_FILE);
            if path.is_file() {
                log::debug!("Reading {}", path.display());
                let f = File::open(&path)
                    .map_err(|_| SeqTagError::missing_mapping("feature", &path))?;
                return FeatureMap::read(flate2::read::GzDecoder::new(BufReader::new(f)));
            }
            let path = prefix.join(ZSTD_FEATURE_MAPPING_FILE);
            if path.is_file() {
                log::debug!("Reading {}", path.display());
                let f = File::open(&path)
                    .map_err(|_| SeqTagError::missing_mapping("feature", &path))?;
                return FeatureMap::read(zstd::Decoder::new(f)?);
            }
        }
        let path = prefix.join(FEATURE_MAPPING_FILE);
        log::debug!("Reading {}", path.display());
        let f =
            File::open(&path).map_err(|_| SeqTagError::missing_mapping("feature", &path))?;
        FeatureMap::read(BufReader::new(f))
    }

    fn load_label_map(prefix: &Path) -> Result<BiMap<String, LabelId>> {
        let path = prefix.join(LABEL_MAPPING_FILE);
        log::debug!("Reading {}", path.display());
        let f =
            File::open(&path).map_err(|_| SeqTagError::missing_mapping("label", &path))?;
        mapping::read_mapping(BufReader::new(f))
    }

    fn feature_mapping_file(&self) -> &'static str {
        match self.compression {
            Compression::None => FEATURE_MAPPING_FILE,
            #[cfg(feature = "compress")]
            Compression::Gzip(_) => GZIP_FEATURE_MAPPING_FILE,
            #[cfg(feature = "compress")]
            Compression::Zstd(_) => ZSTD_FEATURE_MAPPING_FILE,
        }
    }

    /// Saves both mappings under `prefix`, creating the directory if needed.
    ///
    /// Files are overwritten in place. A failure leaves them incomplete, so callers that need
    /// a consistent snapshot should save into a temporary directory and rename it.
    ///
    /// # Errors
    ///
    /// I/O and encoding errors are returned as is.
    pub fn save<P>(&self, prefix: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let prefix = prefix.as_ref();
        fs::create_dir_all(prefix)?;

        let file = self.feature_mapping_file();
        let path = prefix.join(file);
        log::debug!("Writing {}", path.display());
        let wtr = BufWriter::new(File::create(&path)?);
        match self.compression {
            Compression::None => {
                let mut wtr = wtr;
                self.feature_map.write(&mut wtr)?;
                wtr.flush()?;
            }
            #[cfg(feature = "compress")]
            Compression::Gzip(level) => {
                let mut wtr = flate2::write::GzEncoder::new(wtr, flate2::Compression::new(level));
                self.feature_map.write(&mut wtr)?;
                wtr.finish()?.flush()?;
            }
            #[cfg(feature = "compress")]
            Compression::Zstd(level) => {
                let mut wtr = zstd::Encoder::new(wtr, level)?;
                self.feature_map.write(&mut wtr)?;
                wtr.finish()?.flush()?;
            }
        }
        // The loader probes the compressed files first, so outdated ones must not survive.
        for stale in feature_mapping_files() {
            let stale = prefix.join(stale);
            if stale != path && stale.is_file() {
                log::warn!("Removing stale {}", stale.display());
                fs::remove_file(stale)?;
            }
        }

        let path = prefix.join(LABEL_MAPPING_FILE);
        log::debug!("Writing {}", path.display());
        mapping::save_mapping(&self.label_map, path)?;

        log::info!(
            "Saved {} features and {} labels to {}",
            self.feature_map.len(),
            self.label_map.len(),
            prefix.display()
        );
        Ok(())
    }

    /// Analyzes a tagged sequence, growing both mappings as needed.
    ///
    /// Every position gets its features (replacing any previous ones) and the label id of its
    /// tag. Unseen feature names and tags receive the next free id.
    ///
    /// # Errors
    ///
    /// If any position is untagged, an error variant is returned before anything is modified.
    pub fn analyze(&mut self, seq: &mut Sequence) -> Result<()> {
        if let Some(t) = seq.iter().position(|obs| !obs.is_tagged()) {
            return Err(SeqTagError::invalid_argument(
                "sequence",
                format!("position {t} is untagged"),
            ));
        }
        for t in 0..seq.len() {
            self.analyze_at(seq, t)?;
        }
        Ok(())
    }

    /// Analyzes position `t` of a sequence in training mode.
    ///
    /// # Errors
    ///
    /// If the position is untagged, an error variant is returned and nothing is modified.
    ///
    /// # Panics
    ///
    /// Panics if `t` is out of bounds.
    pub fn analyze_at(&mut self, seq: &mut Sequence, t: usize) -> Result<()> {
        let Some(tag) = seq[t].tag() else {
            return Err(SeqTagError::invalid_argument(
                "sequence",
                format!("position {t} is untagged"),
            ));
        };
        let mut vector = FeatureVector::new();
        let mut coll = MutatingCollector::new(&mut self.feature_map, &mut vector);
        observe(&self.obs_fns, seq, t, &mut coll);

        if !self.label_map.contains_key(tag) {
            let id = LabelId(self.label_map.len() as u64);
            self.label_map.insert(tag.to_string(), id)?;
        }
        let label = *self.label_map.get_value(tag)?;
        seq[t].features = vector;
        seq[t].label = Some(label);
        Ok(())
    }

    /// Analyzes a sequence without modifying the mappings.
    ///
    /// Unseen feature names resolve to `FeatureId(self.num_features())`. Positions that are
    /// untagged or whose tag is unknown get `LabelId(self.num_labels())`.
    pub fn analyze_readonly(&self, seq: &mut Sequence) {
        for t in 0..seq.len() {
            self.analyze_readonly_at(seq, t);
        }
    }

    /// Analyzes position `t` of a sequence without modifying the mappings.
    ///
    /// # Panics
    ///
    /// Panics if `t` is out of bounds.
    pub fn analyze_readonly_at(&self, seq: &mut Sequence, t: usize) {
        let mut vector = FeatureVector::new();
        let mut coll = ReadOnlyCollector::new(&self.feature_map, &mut vector);
        observe(&self.obs_fns, seq, t, &mut coll);

        let label = seq[t]
            .tag()
            .and_then(|tag| self.label_map.get_value(tag).ok().copied())
            .unwrap_or(LabelId(self.label_map.len() as u64));
        seq[t].features = vector;
        seq[t].label = Some(label);
    }

    /// Gets the id of a feature name, registering it if unseen.
    pub fn feature(&mut self, name: &str) -> FeatureId {
        self.feature_map.resolve_mutating(name)
    }

    /// Gets the id of a feature name, or `FeatureId(self.num_features())` if unseen.
    pub fn feature_readonly(&self, name: &str) -> FeatureId {
        self.feature_map.resolve_readonly(name)
    }

    pub fn num_features(&self) -> usize {
        self.feature_map.len()
    }

    pub fn feature_map(&self) -> &FeatureMap {
        &self.feature_map
    }

    pub fn labels(&self) -> &BiMap<String, LabelId> {
        &self.label_map
    }

    /// Gets the label id of a tag.
    ///
    /// # Errors
    ///
    /// If the tag has never been seen, a not-found error is returned.
    pub fn label(&self, tag: &str) -> Result<LabelId> {
        self.label_map.get_value(tag).copied()
    }

    /// Gets the tag of a label id.
    ///
    /// # Errors
    ///
    /// If the label id is not assigned, a not-found error is returned.
    pub fn tag(&self, label: LabelId) -> Result<&str> {
        self.label_map.get_key(&label).map(String::as_str)
    }

    pub fn num_labels(&self) -> usize {
        self.label_map.len()
    }
}
