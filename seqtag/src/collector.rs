//! Sinks through which observation functions emit named features.
//!
//! A collector is scoped to one position of one analysis call. It resolves each feature name
//! to an id and adds the weight to that position's [`FeatureVector`]. Weights of a name that
//! is emitted more than once at the same position are summed.

use crate::feature_map::FeatureMap;
use crate::sequence::FeatureVector;

/// Capability handed to observation functions.
pub trait Collector {
    /// Emits the feature `name` with the given weight.
    fn add(&mut self, name: &str, weight: f64);
}

/// Collector used while training. Unseen names are registered in the feature mapping.
pub struct MutatingCollector<'a> {
    features: &'a mut FeatureMap,
    vector: &'a mut FeatureVector,
}

impl<'a> MutatingCollector<'a> {
    pub fn new(features: &'a mut FeatureMap, vector: &'a mut FeatureVector) -> Self {
        Self { features, vector }
    }
}

impl Collector for MutatingCollector<'_> {
    fn add(&mut self, name: &str, weight: f64) {
        let id = self.features.resolve_mutating(name);
        self.vector.add(id, weight);
    }
}

/// Collector used at inference time. The feature mapping is never modified; unseen names
/// resolve to [`FeatureMap::oov_id()`].
pub struct ReadOnlyCollector<'a> {
    features: &'a FeatureMap,
    vector: &'a mut FeatureVector,
}

impl<'a> ReadOnlyCollector<'a> {
    pub fn new(features: &'a FeatureMap, vector: &'a mut FeatureVector) -> Self {
        Self { features, vector }
    }
}

impl Collector for ReadOnlyCollector<'_> {
    fn add(&mut self, name: &str, weight: f64) {
        let id = self.features.resolve_readonly(name);
        self.vector.add(id, weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ids::FeatureId;

    #[test]
    fn test_mutating_collector_registers() {
        let mut features = FeatureMap::new();
        let mut vector = FeatureVector::new();
        let mut coll = MutatingCollector::new(&mut features, &mut vector);
        coll.add("bias", 1.0);
        coll.add("w[t]=dog", 1.0);

        assert_eq!(2, features.len());
        assert_eq!(Some(1.0), vector.get(FeatureId(0)));
        assert_eq!(Some(1.0), vector.get(FeatureId(1)));
    }

    #[test]
    fn test_mutating_collector_sums_repeated_names() {
        let mut features = FeatureMap::new();
        let mut vector = FeatureVector::new();
        let mut coll = MutatingCollector::new(&mut features, &mut vector);
        coll.add("w[t]_suffix_1=s", 1.0);
        coll.add("w[t]_suffix_1=s", 0.5);

        assert_eq!(1, features.len());
        assert_eq!(1, vector.len());
        assert_eq!(Some(1.5), vector.get(FeatureId(0)));
    }

    #[test]
    fn test_read_only_collector_sentinel() {
        let mut features = FeatureMap::new();
        features.resolve_mutating("bias");
        let mut vector = FeatureVector::new();
        let mut coll = ReadOnlyCollector::new(&features, &mut vector);
        coll.add("bias", 1.0);
        coll.add("w[t]=cat", 1.0);
        coll.add("w[t]=emu", 2.0);

        assert_eq!(1, features.len());
        assert_eq!(Some(1.0), vector.get(FeatureId(0)));
        // both unseen names share the sentinel entry
        assert_eq!(Some(3.0), vector.get(FeatureId(1)));
        assert_eq!(2, vector.len());
    }
}
