//! Deterministic stitching of overlapping transcript fragments.

/// Merge an incoming transcript fragment into previously accumulated text.
///
/// Streaming transcription providers resend, extend, and overlap their
/// hypotheses freely. This function reconciles those cases:
///
/// - either side empty, or equal strings: return the other side unchanged
/// - `incoming` extends `existing` (same hypothesis grew): take `incoming`
/// - `existing` already ends with `incoming` (suffix resent): keep `existing`
/// - otherwise stitch at the greatest suffix/prefix overlap
/// - no overlap at all: concatenate, favoring duplicated words over
///   dropped ones
///
/// Pure and total for arbitrary strings, including multi-byte text.
pub fn merge_transcript_text(existing: &str, incoming: &str) -> String {
    if existing.is_empty() {
        return incoming.to_string();
    }
    if incoming.is_empty() || existing == incoming {
        return existing.to_string();
    }
    if incoming.starts_with(existing) {
        return incoming.to_string();
    }
    if existing.ends_with(incoming) {
        return existing.to_string();
    }

    let max = existing.len().min(incoming.len());
    for k in (1..=max).rev() {
        if !incoming.is_char_boundary(k) {
            continue;
        }
        if existing.ends_with(&incoming[..k]) {
            let mut merged = String::with_capacity(existing.len() + incoming.len() - k);
            merged.push_str(existing);
            merged.push_str(&incoming[k..]);
            return merged;
        }
    }

    format!("{existing}{incoming}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sides() {
        assert_eq!(merge_transcript_text("", "hello"), "hello");
        assert_eq!(merge_transcript_text("hello", ""), "hello");
        assert_eq!(merge_transcript_text("", ""), "");
    }

    #[test]
    fn idempotent_on_equal_input() {
        for s in ["", "a", "hello world", "¿qué tal?"] {
            assert_eq!(merge_transcript_text(s, s), s);
        }
    }

    #[test]
    fn extension_takes_incoming() {
        assert_eq!(merge_transcript_text("I think", "I think so"), "I think so");
    }

    #[test]
    fn resent_suffix_keeps_existing() {
        assert_eq!(merge_transcript_text("I think so", "so"), "I think so");
    }

    #[test]
    fn overlap_stitch() {
        assert_eq!(merge_transcript_text("hello wor", "world"), "hello world");
        assert_eq!(
            merge_transcript_text("the quick brown", "brown fox"),
            "the quick brown fox"
        );
    }

    #[test]
    fn no_overlap_concatenates() {
        assert_eq!(merge_transcript_text("abc", "xyz"), "abcxyz");
    }

    #[test]
    fn picks_greatest_overlap() {
        // "aba" overlaps "ba..." at k=2, not just "a" at k=1
        assert_eq!(merge_transcript_text("aba", "bac"), "abac");
    }

    #[test]
    fn multibyte_input_is_safe() {
        assert_eq!(merge_transcript_text("héllo wö", "wörld"), "héllo wörld");
        assert_eq!(merge_transcript_text("日本", "本語"), "日本語");
        assert_eq!(merge_transcript_text("héllo", "ñandú"), "hélloñandú");
    }
}
