/// Splits a raw transcript into the word sequence the recognizer expects.
///
/// Elisions are split after the apostrophe (`l'homme` becomes `l'` and
/// `homme`) because pronunciation lexicons list the elided article as its
/// own entry. Surrounding punctuation is dropped, inner apostrophes and
/// hyphens are kept, and words are lowercased.
pub fn extract_words(transcript: &str) -> Vec<String> {
    let cleaned = clean_text(transcript);
    cleaned
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !is_word_char(c))
                .trim_start_matches(|c: char| c == '\'' || c == '-')
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Flat string handed to the speech aligner: units separated by one space.
pub fn join_units<S: AsRef<str>>(units: &[S]) -> String {
    units
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if c == '\'' || c == '\u{2019}' {
            out.push_str("' ");
        } else {
            out.push(c);
        }
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '-'
}
