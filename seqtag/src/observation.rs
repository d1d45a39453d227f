//! Observation functions and the default part-of-speech pipeline.
//!
//! An observation function reads a whole [`Sequence`] and a position index, and emits named
//! features for that position through a [`Collector`]. It never modifies the sequence.

use std::borrow::Cow;

use crate::analyzer::SequenceAnalyzer;
use crate::collector::Collector;
use crate::sequence::Sequence;

/// Boxed observation function as stored in an analyzer's pipeline.
pub type ObservationFn = Box<dyn Fn(&Sequence, usize, &mut dyn Collector) + Send + Sync>;

// Longest prefix and suffix emitted for the current word.
const MAX_AFFIX_LEN: usize = 4;

// Virtual tokens at positions -1 and -2.
const BEGIN_MARKERS: [&str; 2] = ["<s>", "<s1>"];

// Virtual tokens at positions len and len + 1.
const END_MARKERS: [&str; 2] = ["</s>", "</s1>"];

/// Converts a token to the canonical form used in feature names.
pub fn fold_case(word: &str) -> String {
    word.to_lowercase()
}

/// First `n` characters of `s`, or the whole of `s` if it is shorter.
fn prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Last `n` characters of `s`, or the whole of `s` if it is shorter.
fn suffix(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

fn word_before(seq: &Sequence, t: usize, k: usize) -> Cow<'static, str> {
    if k <= t {
        Cow::Owned(fold_case(seq[t - k].symbol()))
    } else {
        Cow::Borrowed(BEGIN_MARKERS[k - t - 1])
    }
}

fn word_after(seq: &Sequence, t: usize, k: usize) -> Cow<'static, str> {
    let pos = t + k;
    if pos < seq.len() {
        Cow::Owned(fold_case(seq[pos].symbol()))
    } else {
        Cow::Borrowed(END_MARKERS[pos - seq.len()])
    }
}

/// Features of the word at `t`: the folded word, its affixes and shape indicators.
pub fn current_word_features(seq: &Sequence, t: usize, coll: &mut dyn Collector) {
    let word = seq[t].symbol();
    let norm = fold_case(word);
    for n in 1..=MAX_AFFIX_LEN {
        coll.add(&format!("w[t]_suffix_{n}={}", suffix(&norm, n)), 1.0);
        coll.add(&format!("w[t]_prefix_{n}={}", prefix(&norm, n)), 1.0);
    }
    coll.add(&format!("w[t]={norm}"), 1.0);

    if word.chars().any(|c| c.is_ascii_digit()) {
        coll.add("w[t]_has_digit=1", 1.0);
    }
    if word.contains('-') {
        coll.add("w[t]_has_hyphen=1", 1.0);
    }
    if word.chars().any(char::is_uppercase) {
        coll.add("w[t]_has_upper=1", 1.0);
        if t != 0 {
            coll.add("w[t]_has_upper_and_not_sentence_start=1", 1.0);
        }
    }
    if !word.is_empty() && word.chars().all(char::is_uppercase) {
        coll.add("w[t]_all_upper=1", 1.0);
    }
}

/// The two preceding words, or begin-of-sequence markers.
pub fn previous_word_features(seq: &Sequence, t: usize, coll: &mut dyn Collector) {
    coll.add(&format!("w[t-1]={}", word_before(seq, t, 1)), 1.0);
    coll.add(&format!("w[t-2]={}", word_before(seq, t, 2)), 1.0);
}

/// The two following words, or end-of-sequence markers.
pub fn next_word_features(seq: &Sequence, t: usize, coll: &mut dyn Collector) {
    coll.add(&format!("w[t+1]={}", word_after(seq, t, 1)), 1.0);
    coll.add(&format!("w[t+2]={}", word_after(seq, t, 2)), 1.0);
}

/// Constant feature present at every position.
pub fn bias(_seq: &Sequence, _t: usize, coll: &mut dyn Collector) {
    coll.add("bias", 1.0);
}

/// Creates an analyzer with empty mappings and the default part-of-speech pipeline.
///
/// # Examples
///
/// ```
/// use seqtag::{default_pos_analyzer, Sequence};
///
/// let mut analyzer = default_pos_analyzer();
/// let mut s = Sequence::from_tagged("The/DT dog/NN barks/VBZ").unwrap();
/// analyzer.analyze(&mut s).unwrap();
/// assert_eq!(3, analyzer.num_labels());
/// ```
pub fn default_pos_analyzer() -> SequenceAnalyzer {
    let mut analyzer = SequenceAnalyzer::new();
    analyzer.add_observation_function(current_word_features);
    analyzer.add_observation_function(previous_word_features);
    analyzer.add_observation_function(next_word_features);
    analyzer.add_observation_function(bias);
    analyzer
}
