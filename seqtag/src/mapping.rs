//! Bidirectional mapping between keys and dense values, and its file serializer.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::{
    config::Config,
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};
use hashbrown::HashMap;

use crate::errors::{Result, SeqTagError};

/// Mapping that can be queried in both directions.
///
/// Each key is associated with exactly one value and vice versa.
#[derive(Clone, Debug)]
pub struct BiMap<K, V> {
    forward: HashMap<K, V>,
    backward: HashMap<V, K>,
}

impl<K, V> Default for BiMap<K, V> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }
}

impl<K, V> BiMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Eq + Hash + Clone + Debug,
{
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            forward: HashMap::with_capacity(capacity),
            backward: HashMap::with_capacity(capacity),
        }
    }

    /// Stores a new association.
    ///
    /// # Errors
    ///
    /// If either `key` or `value` is already mapped, an error variant will be returned and the
    /// mapping is left unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        if self.forward.contains_key(&key) {
            return Err(SeqTagError::invalid_argument(
                "key",
                format!("{key:?} is already mapped"),
            ));
        }
        if self.backward.contains_key(&value) {
            return Err(SeqTagError::invalid_argument(
                "value",
                format!("{value:?} is already mapped"),
            ));
        }
        self.forward.insert(key.clone(), value.clone());
        self.backward.insert(value, key);
        Ok(())
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.forward.contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool {
        self.backward.contains_key(value)
    }

    /// Gets the value associated with `key`.
    ///
    /// # Errors
    ///
    /// If `key` is not mapped, a not-found error will be returned.
    pub fn get_value<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + Debug,
    {
        self.forward
            .get(key)
            .ok_or_else(|| SeqTagError::not_found(format!("key {key:?} is not mapped")))
    }

    /// Gets the key associated with `value`.
    ///
    /// # Errors
    ///
    /// If `value` is not mapped, a not-found error will be returned.
    pub fn get_key(&self, value: &V) -> Result<&K> {
        self.backward
            .get(value)
            .ok_or_else(|| SeqTagError::not_found(format!("value {value:?} is not mapped")))
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
    }
}

impl<K, V> BiMap<K, V>
where
    V: Ord,
{
    /// Iterates over the associations in ascending value order.
    pub fn iter(&self) -> std::vec::IntoIter<(&K, &V)> {
        let mut entries: Vec<_> = self.forward.iter().collect();
        entries.sort_unstable_by(|a, b| a.1.cmp(b.1));
        entries.into_iter()
    }
}

impl<K, V> Encode for BiMap<K, V>
where
    K: Encode,
    V: Encode + Ord,
{
    fn encode<E: Encoder>(&self, encoder: &mut E) -> std::result::Result<(), EncodeError> {
        // Same layout as a `Vec<(K, V)>`: the entry count, then each pair.
        (self.forward.len() as u64).encode(encoder)?;
        for (key, value) in self.iter() {
            key.encode(encoder)?;
            value.encode(encoder)?;
        }
        Ok(())
    }
}

impl<K, V> Decode for BiMap<K, V>
where
    K: Decode + Eq + Hash + Clone + Debug,
    V: Decode + Eq + Hash + Clone + Debug,
{
    fn decode<D: Decoder>(decoder: &mut D) -> std::result::Result<Self, DecodeError> {
        let len = u64::decode(decoder)?;
        let len = usize::try_from(len).map_err(|_| DecodeError::OutsideUsizeRange(len))?;
        let mut map = Self::with_capacity(len.min(1 << 16));
        for _ in 0..len {
            let key = K::decode(decoder)?;
            let value = V::decode(decoder)?;
            map.insert(key, value)
                .map_err(|e| DecodeError::OtherString(e.to_string()))?;
        }
        Ok(map)
    }
}

// Fixed-width integers keep the entry count an 8-byte header.
fn mapping_config() -> impl Config {
    bincode::config::standard().with_fixed_int_encoding()
}

/// Reads a mapping written by [`write_mapping()`].
pub fn read_mapping<K, V, R>(mut rdr: R) -> Result<BiMap<K, V>>
where
    K: Decode + Eq + Hash + Clone + Debug,
    V: Decode + Eq + Hash + Clone + Debug,
    R: Read,
{
    Ok(bincode::decode_from_std_read(&mut rdr, mapping_config())?)
}

/// Writes a mapping as an entry count followed by `(key, value)` records in value order.
pub fn write_mapping<K, V, W>(map: &BiMap<K, V>, mut wtr: W) -> Result<()>
where
    K: Encode,
    V: Encode + Ord,
    W: Write,
{
    bincode::encode_into_std_write(map, &mut wtr, mapping_config())?;
    Ok(())
}

/// Reads a mapping file written by [`save_mapping()`].
pub fn load_mapping<K, V, P>(path: P) -> Result<BiMap<K, V>>
where
    K: Decode + Eq + Hash + Clone + Debug,
    V: Decode + Eq + Hash + Clone + Debug,
    P: AsRef<Path>,
{
    read_mapping(BufReader::new(File::open(path)?))
}

/// Writes a mapping file.
pub fn save_mapping<K, V, P>(map: &BiMap<K, V>, path: P) -> Result<()>
where
    K: Encode,
    V: Encode + Ord,
    P: AsRef<Path>,
{
    let mut wtr = BufWriter::new(File::create(path)?);
    write_mapping(map, &mut wtr)?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ids::LabelId;

    fn sample() -> BiMap<String, LabelId> {
        let mut map = BiMap::new();
        map.insert("NN".to_string(), LabelId(0)).unwrap();
        map.insert("DT".to_string(), LabelId(1)).unwrap();
        map.insert("VBZ".to_string(), LabelId(2)).unwrap();
        map
    }

    #[test]
    fn test_bimap_both_directions() {
        let map = sample();

        assert_eq!(3, map.len());
        assert_eq!(&LabelId(1), map.get_value("DT").unwrap());
        assert_eq!("VBZ", map.get_key(&LabelId(2)).unwrap());
        assert!(map.contains_key("NN"));
        assert!(map.contains_value(&LabelId(0)));
        assert!(!map.contains_key("JJ"));
    }

    #[test]
    fn test_bimap_insert_existing_key() {
        let mut map = sample();
        let e = map.insert("NN".to_string(), LabelId(3)).unwrap_err();

        assert_eq!(
            "InvalidArgumentError: key: \"NN\" is already mapped",
            &e.to_string()
        );
        assert_eq!(3, map.len());
        assert!(!map.contains_value(&LabelId(3)));
    }

    #[test]
    fn test_bimap_insert_existing_value() {
        let mut map = sample();
        let e = map.insert("JJ".to_string(), LabelId(0)).unwrap_err();

        assert_eq!(
            "InvalidArgumentError: value: LabelId(0) is already mapped",
            &e.to_string()
        );
        assert!(!map.contains_key("JJ"));
    }

    #[test]
    fn test_bimap_not_found() {
        let map = sample();

        assert_eq!(
            "NotFoundError: key \"JJ\" is not mapped",
            &map.get_value("JJ").unwrap_err().to_string()
        );
        assert_eq!(
            "NotFoundError: value LabelId(7) is not mapped",
            &map.get_key(&LabelId(7)).unwrap_err().to_string()
        );
    }

    #[test]
    fn test_bimap_iter_value_order() {
        let map = sample();
        let entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.0)).collect();

        assert_eq!(vec![("NN", 0), ("DT", 1), ("VBZ", 2)], entries);
    }

    #[test]
    fn test_bimap_clear() {
        let mut map = sample();
        map.clear();

        assert!(map.is_empty());
        assert!(!map.contains_value(&LabelId(0)));
    }

    #[test]
    fn test_bimap_encode_header_and_order() {
        let map = sample();
        let bytes = bincode::encode_to_vec(&map, mapping_config()).unwrap();

        assert_eq!(&3u64.to_le_bytes(), &bytes[..8]);
        // first record: "NN" (u64 length + bytes) followed by its u64 id
        assert_eq!(&2u64.to_le_bytes(), &bytes[8..16]);
        assert_eq!(b"NN", &bytes[16..18]);
        assert_eq!(&0u64.to_le_bytes(), &bytes[18..26]);

        let (decoded, _): (BiMap<String, LabelId>, usize) =
            bincode::decode_from_slice(&bytes, mapping_config()).unwrap();
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            decoded.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_bimap_decode_duplicate_value() {
        let raw = vec![("NN".to_string(), LabelId(0)), ("DT".to_string(), LabelId(0))];
        let bytes = bincode::encode_to_vec(&raw, mapping_config()).unwrap();
        let result: std::result::Result<(BiMap<String, LabelId>, usize), _> =
            bincode::decode_from_slice(&bytes, mapping_config());

        assert!(result.is_err());
    }

    #[test]
    fn test_save_load_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.mapping");
        let map = sample();
        save_mapping(&map, &path).unwrap();
        let loaded: BiMap<String, LabelId> = load_mapping(&path).unwrap();

        assert_eq!(3, loaded.len());
        for (tag, label) in map.iter() {
            assert_eq!(label, loaded.get_value(tag.as_str()).unwrap());
            assert_eq!(tag, loaded.get_key(label).unwrap());
        }
    }
}
