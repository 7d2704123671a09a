use crate::alignment::tokenization::{extract_words, join_units};
use crate::error::LipSyncError;
use crate::pipeline::traits::Pronouncer;
use crate::types::Unit;

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptWord {
    spelling: String,
    phones: Vec<String>,
}

impl TranscriptWord {
    pub fn new(spelling: impl Into<String>, phones: Vec<String>) -> Self {
        Self {
            spelling: spelling.into(),
            phones,
        }
    }

    pub fn spelling(&self) -> &str {
        &self.spelling
    }

    pub fn phones(&self) -> &[String] {
        &self.phones
    }
}

impl std::fmt::Display for TranscriptWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.spelling, self.phones.join(" "))
    }
}

/// The expected word sequence with one pronunciation per word.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    words: Vec<TranscriptWord>,
    pronunciations_updated: bool,
}

impl Transcript {
    pub fn new(words: Vec<TranscriptWord>) -> Self {
        Self {
            words,
            pronunciations_updated: false,
        }
    }

    /// Tokenizes `text` and looks up every word's first pronunciation.
    pub fn from_text(text: &str, pronouncer: &dyn Pronouncer) -> Result<Self, LipSyncError> {
        let words = extract_words(text)
            .into_iter()
            .map(|word| {
                let phones = pronouncer.pronounce(&word)?;
                Ok(TranscriptWord::new(word, phones))
            })
            .collect::<Result<Vec<_>, LipSyncError>>()?;
        Ok(Self::new(words))
    }

    pub fn words(&self) -> &[TranscriptWord] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn spellings(&self) -> Vec<String> {
        self.words.iter().map(|w| w.spelling.clone()).collect()
    }

    /// Flat text for the word-level recognition pass.
    pub fn to_word_string(&self) -> String {
        join_units(&self.spellings())
    }

    pub fn phone_spellings(&self) -> Vec<String> {
        self.words
            .iter()
            .flat_map(|w| w.phones.iter().cloned())
            .collect()
    }

    /// Flat text for the phone-level recognition pass.
    pub fn to_phone_string(&self) -> String {
        join_units(&self.phone_spellings())
    }

    pub fn word_phone_index(&self) -> WordPhoneIndex {
        WordPhoneIndex::from_lengths(self.words.iter().map(|w| w.phones.len()))
    }

    /// Replaces the dictionary phones of every matched word with the
    /// pronunciation the recognizer actually used. Allowed once per run.
    pub fn update_pronunciations(
        &mut self,
        merged_words: &[Unit],
        recognized_phones: &[Option<Vec<String>>],
    ) -> Result<usize, LipSyncError> {
        if self.pronunciations_updated {
            return Err(LipSyncError::invalid_input(
                "transcript pronunciations were already updated",
            ));
        }
        if merged_words.len() != self.words.len() || recognized_phones.len() != self.words.len() {
            return Err(LipSyncError::invalid_input(format!(
                "word merge covers {} words, transcript has {}",
                merged_words.len(),
                self.words.len()
            )));
        }

        let mut updated = 0usize;
        for ((word, unit), phones) in self
            .words
            .iter_mut()
            .zip(merged_words)
            .zip(recognized_phones)
        {
            if !unit.matched {
                continue;
            }
            let Some(phones) = phones.as_ref().filter(|p| !p.is_empty()) else {
                continue;
            };
            if word.phones != *phones {
                tracing::debug!(
                    word = word.spelling.as_str(),
                    dictionary = word.phones.join(" ").as_str(),
                    recognized = phones.join(" ").as_str(),
                    "transcript: recognizer chose another pronunciation"
                );
                updated += 1;
            }
            word.phones = phones.clone();
        }
        self.pronunciations_updated = true;
        Ok(updated)
    }
}

/// Start offset of every word's phones in the flat phone sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPhoneIndex {
    offsets: Vec<usize>,
}

impl WordPhoneIndex {
    pub fn from_lengths(lengths: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0usize];
        for len in lengths {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + len);
        }
        Self { offsets }
    }

    pub fn word_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn phone_count(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Phone index range of word `word`.
    pub fn span(&self, word: usize) -> std::ops::Range<usize> {
        self.offsets[word]..self.offsets[word + 1]
    }

    pub fn word_of_phone(&self, phone: usize) -> Option<usize> {
        if phone >= self.phone_count() {
            return None;
        }
        // Empty words share their offset with the next word, so the last
        // offset <= phone always starts a non-empty span.
        let upper = self.offsets.partition_point(|&offset| offset <= phone);
        Some(upper - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Interval;
    use std::collections::HashMap;

    struct MapPronouncer(HashMap<&'static str, Vec<&'static str>>);

    impl Pronouncer for MapPronouncer {
        fn pronounce(&self, word: &str) -> Result<Vec<String>, LipSyncError> {
            self.0
                .get(word)
                .map(|phones| phones.iter().map(|p| p.to_string()).collect())
                .ok_or_else(|| LipSyncError::MissingPronunciation {
                    word: word.to_string(),
                })
        }
    }

    fn pronouncer() -> MapPronouncer {
        let mut map = HashMap::new();
        map.insert("le", vec!["ll", "ee"]);
        map.insert("chat", vec!["ch", "aa"]);
        map.insert("dort", vec!["dd", "oo", "rr"]);
        MapPronouncer(map)
    }

    #[test]
    fn from_text_pronounces_every_word() {
        let transcript = Transcript::from_text("Le chat dort.", &pronouncer()).unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.to_word_string(), "le chat dort");
        assert_eq!(transcript.to_phone_string(), "ll ee ch aa dd oo rr");
    }

    #[test]
    fn from_text_propagates_missing_pronunciation() {
        let result = Transcript::from_text("le chien", &pronouncer());
        assert!(matches!(
            result,
            Err(LipSyncError::MissingPronunciation { ref word }) if word == "chien"
        ));
    }

    #[test]
    fn word_phone_index_offsets() {
        let transcript = Transcript::from_text("le chat dort", &pronouncer()).unwrap();
        let index = transcript.word_phone_index();
        assert_eq!(index.word_count(), 3);
        assert_eq!(index.phone_count(), 7);
        assert_eq!(index.span(0), 0..2);
        assert_eq!(index.span(1), 2..4);
        assert_eq!(index.span(2), 4..7);
        assert_eq!(index.word_of_phone(3), Some(1));
        assert_eq!(index.word_of_phone(6), Some(2));
        assert_eq!(index.word_of_phone(7), None);
    }

    #[test]
    fn word_of_phone_skips_empty_words() {
        let index = WordPhoneIndex::from_lengths([2, 0, 1]);
        assert_eq!(index.span(1), 2..2);
        assert_eq!(index.word_of_phone(2), Some(2));
    }

    #[test]
    fn update_pronunciations_only_touches_matched_words() {
        let mut transcript = Transcript::from_text("le chat dort", &pronouncer()).unwrap();
        let merged = vec![
            Unit::matched("le", Interval::new(0, 100)),
            Unit::unmatched("chat"),
            Unit::matched("dort", Interval::new(200, 400)),
        ];
        let recognized = vec![
            Some(vec!["ll".to_string(), "eu".to_string()]),
            None,
            Some(vec!["dd".to_string(), "oo".to_string(), "rr".to_string()]),
        ];
        let updated = transcript
            .update_pronunciations(&merged, &recognized)
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(transcript.words()[0].phones(), ["ll", "eu"]);
        assert_eq!(transcript.words()[1].phones(), ["ch", "aa"]);

        let again = transcript.update_pronunciations(&merged, &recognized);
        assert!(again.is_err());
    }
}
