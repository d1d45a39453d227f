use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use crate::errors::{Result, SeqTagError};
use crate::ids::{FeatureId, LabelId};

/// Sparse weighted features of a single position.
///
/// Adding a feature id that is already present sums the weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureVector(BTreeMap<FeatureId, f64>);

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight` to the feature `id`.
    pub fn add(&mut self, id: FeatureId, weight: f64) {
        *self.0.entry(id).or_insert(0.0) += weight;
    }

    pub fn get(&self, id: FeatureId) -> Option<f64> {
        self.0.get(&id).copied()
    }

    /// Iterates over `(id, weight)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f64)> + '_ {
        self.0.iter().map(|(&id, &w)| (id, w))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One position of a [`Sequence`].
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub(crate) symbol: String,
    pub(crate) tag: Option<String>,
    pub(crate) label: Option<LabelId>,
    pub(crate) features: FeatureVector,
}

impl Observation {
    /// Creates an untagged observation.
    pub fn new<S>(symbol: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            symbol: symbol.into(),
            tag: None,
            label: None,
            features: FeatureVector::new(),
        }
    }

    /// Creates an observation with a known tag.
    pub fn tagged<S, T>(symbol: S, tag: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        let mut obs = Self::new(symbol);
        obs.tag = Some(tag.into());
        obs
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    /// Gets the label id assigned by the analyzer, if the position has been analyzed.
    pub fn label(&self) -> Option<LabelId> {
        self.label
    }

    pub fn features(&self) -> &FeatureVector {
        &self.features
    }
}

/// Sequence of tokens to be labeled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    observations: Vec<Observation>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Sequence`] from `word/TAG` tokens separated by single spaces.
    ///
    /// The last unescaped `/` of a token separates the tag; a token without one is untagged.
    /// A backslash escapes the following character, so `\ ` and `\<TAB>` are literal.
    ///
    /// # Errors
    ///
    /// This function will return an error variant when:
    ///
    /// * `tagged_text` is empty.
    /// * `tagged_text` starts/ends with a whitespace.
    /// * `tagged_text` contains consecutive whitespaces.
    /// * `tagged_text` contains an unescaped whitespace other than a space.
    /// * a token has an empty symbol or an empty tag.
    /// * `tagged_text` ends with an escape character.
    ///
    /// # Examples
    ///
    /// ```
    /// use seqtag::Sequence;
    ///
    /// let s = Sequence::from_tagged("The/DT dog/NN barks/VBZ").unwrap();
    /// assert_eq!(3, s.len());
    /// assert_eq!(Some("NN"), s[1].tag());
    ///
    /// let s = Sequence::from_tagged("The  dog");
    /// assert!(s.is_err());
    /// ```
    pub fn from_tagged<S>(tagged_text: S) -> Result<Self>
    where
        S: AsRef<str>,
    {
        let tagged_text = tagged_text.as_ref();

        if tagged_text.is_empty() {
            return Err(SeqTagError::invalid_argument("tagged_text", "is empty"));
        }

        let mut observations = vec![];
        let mut buf = String::new();
        let mut sep = None;
        let mut prev_boundary = false;
        let mut escape = false;
        for c in tagged_text.chars() {
            match (escape, c) {
                (false, '\\') => {
                    escape = true;
                }
                (false, ' ') => {
                    if observations.is_empty() && buf.is_empty() {
                        return Err(SeqTagError::invalid_argument(
                            "tagged_text",
                            "starts with a whitespace",
                        ));
                    } else if prev_boundary {
                        return Err(SeqTagError::invalid_argument(
                            "tagged_text",
                            "contains consecutive whitespaces",
                        ));
                    }
                    observations.push(Self::finish_token(&mut buf, sep.take())?);
                    prev_boundary = true;
                }
                (false, c) if c.is_whitespace() => {
                    return Err(SeqTagError::invalid_argument(
                        "tagged_text",
                        "contains a whitespace other than a space",
                    ));
                }
                (false, '/') => {
                    sep = Some(buf.len());
                    buf.push(c);
                    prev_boundary = false;
                }
                (_, _) => {
                    buf.push(c);
                    prev_boundary = false;
                    escape = false;
                }
            }
        }
        if escape {
            return Err(SeqTagError::invalid_argument(
                "tagged_text",
                "ends with an escape character",
            ));
        }
        if prev_boundary {
            return Err(SeqTagError::invalid_argument(
                "tagged_text",
                "ends with a whitespace",
            ));
        }
        observations.push(Self::finish_token(&mut buf, sep)?);

        Ok(Self { observations })
    }

    fn finish_token(buf: &mut String, sep: Option<usize>) -> Result<Observation> {
        let token = std::mem::take(buf);
        let obs = match sep {
            Some(i) => {
                let (symbol, tag) = (&token[..i], &token[i + 1..]);
                if tag.is_empty() {
                    return Err(SeqTagError::invalid_argument(
                        "tagged_text",
                        "contains an empty tag",
                    ));
                }
                Observation::tagged(symbol, tag)
            }
            None => Observation::new(token),
        };
        if obs.symbol.is_empty() {
            return Err(SeqTagError::invalid_argument(
                "tagged_text",
                "contains an empty symbol",
            ));
        }
        Ok(obs)
    }

    /// Generates a `word/TAG` string, escaping `\`, `/` and whitespaces.
    ///
    /// # Examples
    ///
    /// ```
    /// use seqtag::Sequence;
    ///
    /// let s = Sequence::from_tagged("1\\/2/CD cup").unwrap();
    /// assert_eq!("1\\/2/CD cup", s.to_tagged_string());
    /// ```
    pub fn to_tagged_string(&self) -> String {
        fn push_escaped(result: &mut String, s: &str) {
            for c in s.chars() {
                if matches!(c, '\\' | '/') || c.is_whitespace() {
                    result.push('\\');
                }
                result.push(c);
            }
        }

        let mut result = String::new();
        for (i, obs) in self.observations.iter().enumerate() {
            if i != 0 {
                result.push(' ');
            }
            push_escaped(&mut result, &obs.symbol);
            if let Some(tag) = &obs.tag {
                result.push('/');
                push_escaped(&mut result, tag);
            }
        }
        result
    }

    pub fn push(&mut self, obs: Observation) {
        self.observations.push(obs);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }
}

impl Index<usize> for Sequence {
    type Output = Observation;

    fn index(&self, t: usize) -> &Observation {
        &self.observations[t]
    }
}

impl IndexMut<usize> for Sequence {
    fn index_mut(&mut self, t: usize) -> &mut Observation {
        &mut self.observations[t]
    }
}

impl From<Vec<Observation>> for Sequence {
    fn from(observations: Vec<Observation>) -> Self {
        Self { observations }
    }
}

impl FromIterator<Observation> for Sequence {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        Self {
            observations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_accumulates() {
        let mut v = FeatureVector::new();
        v.add(FeatureId(3), 1.0);
        v.add(FeatureId(1), 0.5);
        v.add(FeatureId(3), 2.0);

        assert_eq!(2, v.len());
        assert_eq!(Some(3.0), v.get(FeatureId(3)));
        assert_eq!(None, v.get(FeatureId(2)));
        assert_eq!(
            vec![(FeatureId(1), 0.5), (FeatureId(3), 3.0)],
            v.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_sequence_from_tagged_empty() {
        let s = Sequence::from_tagged("");

        assert_eq!(
            "InvalidArgumentError: tagged_text: is empty",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged_start_with_space() {
        let s = Sequence::from_tagged(" The/DT dog/NN");

        assert_eq!(
            "InvalidArgumentError: tagged_text: starts with a whitespace",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged_end_with_space() {
        let s = Sequence::from_tagged("The/DT dog/NN ");

        assert_eq!(
            "InvalidArgumentError: tagged_text: ends with a whitespace",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged_consecutive_spaces() {
        let s = Sequence::from_tagged("The/DT  dog/NN");

        assert_eq!(
            "InvalidArgumentError: tagged_text: contains consecutive whitespaces",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged_tab() {
        let s = Sequence::from_tagged("The/DT\tdog/NN");

        assert_eq!(
            "InvalidArgumentError: tagged_text: contains a whitespace other than a space",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged_escaped_tab() {
        let s = Sequence::from_tagged("a\\\tb/SYM").unwrap();

        assert_eq!("a\tb", s[0].symbol());
        assert_eq!("a\\\tb/SYM", s.to_tagged_string());
    }

    #[test]
    fn test_sequence_from_tagged_empty_tag() {
        let s = Sequence::from_tagged("The/ dog/NN");

        assert_eq!(
            "InvalidArgumentError: tagged_text: contains an empty tag",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged_empty_symbol() {
        let s = Sequence::from_tagged("/DT dog/NN");

        assert_eq!(
            "InvalidArgumentError: tagged_text: contains an empty symbol",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged_dangling_escape() {
        let s = Sequence::from_tagged("dog\\");

        assert_eq!(
            "InvalidArgumentError: tagged_text: ends with an escape character",
            &s.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_sequence_from_tagged() {
        let s = Sequence::from_tagged("The/DT dog/NN barks").unwrap();

        let expected = Sequence::from(vec![
            Observation::tagged("The", "DT"),
            Observation::tagged("dog", "NN"),
            Observation::new("barks"),
        ]);
        assert_eq!(expected, s);
        assert!(s[1].is_tagged());
        assert!(!s[2].is_tagged());
        assert_eq!(None, s[0].label());
        assert!(s[0].features().is_empty());
    }

    #[test]
    fn test_sequence_from_tagged_last_slash_wins() {
        let s = Sequence::from_tagged("1/2/CD and\\/or/CC").unwrap();

        assert_eq!("1/2", s[0].symbol());
        assert_eq!(Some("CD"), s[0].tag());
        assert_eq!("and/or", s[1].symbol());
        assert_eq!(Some("CC"), s[1].tag());
    }

    #[test]
    fn test_sequence_to_tagged_string() {
        let s = Sequence::from(vec![
            Observation::tagged("1/2", "CD"),
            Observation::new("a b"),
            Observation::tagged("x\\y", "SYM"),
        ]);

        assert_eq!("1\\/2/CD a\\ b x\\\\y/SYM", s.to_tagged_string());
        assert_eq!(s, Sequence::from_tagged(s.to_tagged_string()).unwrap());
    }
}
