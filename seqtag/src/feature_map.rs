//! Growable mapping from feature names to feature ids, and its binary file format.
//!
//! The file starts with a little-endian `u64` holding the number of records at save time,
//! followed by records of a length-prefixed UTF-8 name and a little-endian `u64` id.
//! The header is advisory: readers consume records until the stream ends.

use std::io::{Read, Write};

use hashbrown::HashMap;

use crate::errors::{Result, SeqTagError};
use crate::ids::FeatureId;
use crate::progress::Progress;
use crate::utils;

/// Compression applied to the feature mapping when it is saved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    /// Plain `feature.mapping`.
    None,

    /// `feature.mapping.gz` compressed at the given gzip level (0-9).
    #[cfg(feature = "compress")]
    #[cfg_attr(docsrs, doc(cfg(feature = "compress")))]
    Gzip(u32),

    /// `feature.mapping.zst` compressed at the given zstd level.
    #[cfg(feature = "compress")]
    #[cfg_attr(docsrs, doc(cfg(feature = "compress")))]
    Zstd(i32),
}

impl Default for Compression {
    #[cfg(feature = "compress")]
    fn default() -> Self {
        Self::Gzip(6)
    }

    #[cfg(not(feature = "compress"))]
    fn default() -> Self {
        Self::None
    }
}

/// Mapping from feature names to dense feature ids.
#[derive(Clone, Debug, Default)]
pub struct FeatureMap {
    ids: HashMap<String, FeatureId>,
}

impl FeatureMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the id of `name`, registering it with the next id if it is unseen.
    pub fn resolve_mutating(&mut self, name: &str) -> FeatureId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.next_id();
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Gets the id of `name` without growing the mapping.
    ///
    /// Unseen names resolve to [`oov_id()`](Self::oov_id).
    pub fn resolve_readonly(&self, name: &str) -> FeatureId {
        self.get(name).unwrap_or_else(|| self.oov_id())
    }

    /// Gets the id that unseen names resolve to in read-only mode, one past the last valid id.
    pub fn oov_id(&self) -> FeatureId {
        self.next_id()
    }

    pub fn get(&self, name: &str) -> Option<FeatureId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over `(name, id)` pairs in ascending id order.
    pub fn iter(&self) -> std::vec::IntoIter<(&str, FeatureId)> {
        let mut entries: Vec<_> = self
            .ids
            .iter()
            .map(|(name, &id)| (name.as_str(), id))
            .collect();
        entries.sort_unstable_by_key(|&(_, id)| id);
        entries.into_iter()
    }

    fn next_id(&self) -> FeatureId {
        FeatureId(self.ids.len() as u64)
    }

    /// Creates a mapping from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream ends inside a record, a name is not valid UTF-8,
    /// or the ids read are not exactly `0..n`.
    pub fn read<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let advisory = utils::read_u64(&mut rdr)?;
        let mut progress = Progress::new(" > Loading feature mapping: ", advisory);
        let mut ids = HashMap::with_capacity(usize::try_from(advisory).unwrap_or(0).min(1 << 20));
        let mut n_records = 0;
        while let Some(name) = utils::read_string_or_eof(&mut rdr)? {
            let id = FeatureId(utils::read_u64(&mut rdr)?);
            ids.insert(name, id);
            n_records += 1;
            progress.update(n_records);
        }
        progress.finish();
        if n_records != advisory {
            log::warn!(
                "feature mapping header claims {advisory} records but {n_records} were read"
            );
        }
        let map = Self { ids };
        map.check_dense()?;
        Ok(map)
    }

    fn check_dense(&self) -> Result<()> {
        let n = self.ids.len();
        let mut seen = vec![false; n];
        for (name, id) in &self.ids {
            let slot = usize::try_from(id.0)
                .ok()
                .and_then(|i| seen.get_mut(i))
                .ok_or_else(|| {
                    SeqTagError::invalid_mapping(format!(
                        "feature {name:?} has id {id} outside 0..{n}"
                    ))
                })?;
            if *slot {
                return Err(SeqTagError::invalid_mapping(format!(
                    "feature id {id} is assigned more than once"
                )));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Exports the mapping, records in ascending id order.
    ///
    /// # Errors
    ///
    /// When `wtr` generates an error, it will be returned as is.
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        let n = self.ids.len() as u64;
        let mut progress = Progress::new(" > Saving feature mapping: ", n);
        utils::write_u64(&mut wtr, n)?;
        for (i, (name, id)) in self.iter().enumerate() {
            utils::write_string(&mut wtr, name)?;
            utils::write_u64(&mut wtr, id.0)?;
            progress.update(i as u64 + 1);
        }
        progress.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(buf: &mut Vec<u8>, name: &str, id: u64) {
        utils::write_string(&mut *buf, name).unwrap();
        utils::write_u64(&mut *buf, id).unwrap();
    }

    #[test]
    fn test_resolve_mutating_first_seen_order() {
        let mut map = FeatureMap::new();

        assert_eq!(FeatureId(0), map.resolve_mutating("bias"));
        assert_eq!(FeatureId(1), map.resolve_mutating("w[t]=dog"));
        assert_eq!(FeatureId(0), map.resolve_mutating("bias"));
        assert_eq!(FeatureId(2), map.resolve_mutating("w[t-1]=<s>"));
        assert_eq!(3, map.len());
    }

    #[test]
    fn test_resolve_readonly_sentinel() {
        let mut map = FeatureMap::new();
        map.resolve_mutating("bias");
        map.resolve_mutating("w[t]=dog");

        assert_eq!(FeatureId(1), map.resolve_readonly("w[t]=dog"));
        assert_eq!(FeatureId(2), map.resolve_readonly("w[t]=cat"));
        assert_eq!(FeatureId(2), map.resolve_readonly("w[t]=emu"));
        assert_eq!(FeatureId(2), map.oov_id());
        assert_eq!(2, map.len());
        assert_eq!(None, map.get("w[t]=cat"));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut map = FeatureMap::new();
        let names = ["bias", "w[t]=the", "w[t]_suffix_1=e", "w[t+1]=</s>", "w[t]=東京"];
        for name in names {
            map.resolve_mutating(name);
        }
        let mut buf = vec![];
        map.write(&mut buf).unwrap();
        let loaded = FeatureMap::read(buf.as_slice()).unwrap();

        assert_eq!(names.len(), loaded.len());
        for name in names {
            assert_eq!(map.get(name), loaded.get(name));
        }
    }

    #[test]
    fn test_write_layout() {
        let mut map = FeatureMap::new();
        map.resolve_mutating("ab");
        let mut buf = vec![];
        map.write(&mut buf).unwrap();

        let mut expected = 1u64.to_le_bytes().to_vec();
        record(&mut expected, "ab", 0);
        assert_eq!(expected, buf);
    }

    #[test]
    fn test_read_ignores_advisory_count() {
        let mut buf = 0u64.to_le_bytes().to_vec();
        record(&mut buf, "b", 1);
        record(&mut buf, "a", 0);
        record(&mut buf, "c", 2);
        let map = FeatureMap::read(buf.as_slice()).unwrap();

        assert_eq!(3, map.len());
        assert_eq!(Some(FeatureId(1)), map.get("b"));
        assert_eq!(
            vec![("a", FeatureId(0)), ("b", FeatureId(1)), ("c", FeatureId(2))],
            map.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_read_header_only() {
        let buf = 5u64.to_le_bytes().to_vec();
        let map = FeatureMap::read(buf.as_slice()).unwrap();

        assert!(map.is_empty());
    }

    #[test]
    fn test_read_empty_stream() {
        let buf: &[u8] = &[];

        assert!(matches!(
            FeatureMap::read(buf).unwrap_err(),
            SeqTagError::IOError(_)
        ));
    }

    #[test]
    fn test_read_truncated_record() {
        let mut buf = 1u64.to_le_bytes().to_vec();
        record(&mut buf, "bias", 0);
        buf.truncate(buf.len() - 3);

        assert!(matches!(
            FeatureMap::read(buf.as_slice()).unwrap_err(),
            SeqTagError::IOError(_)
        ));
    }

    #[test]
    fn test_read_gapped_ids() {
        let mut buf = 2u64.to_le_bytes().to_vec();
        record(&mut buf, "a", 0);
        record(&mut buf, "b", 2);
        let e = FeatureMap::read(buf.as_slice()).unwrap_err();

        assert_eq!(
            "InvalidMappingError: feature \"b\" has id 2 outside 0..2",
            &e.to_string()
        );
    }

    #[test]
    fn test_read_duplicate_ids() {
        let mut buf = 2u64.to_le_bytes().to_vec();
        record(&mut buf, "a", 0);
        record(&mut buf, "b", 0);
        let e = FeatureMap::read(buf.as_slice()).unwrap_err();

        assert_eq!(
            "InvalidMappingError: feature id 0 is assigned more than once",
            &e.to_string()
        );
    }

    #[test]
    fn test_loaded_map_keeps_growing() {
        let mut buf = 2u64.to_le_bytes().to_vec();
        record(&mut buf, "b", 1);
        record(&mut buf, "a", 0);
        let mut map = FeatureMap::read(buf.as_slice()).unwrap();

        assert_eq!(FeatureId(2), map.resolve_mutating("c"));
        assert_eq!(FeatureId(0), map.resolve_mutating("a"));
    }
}
