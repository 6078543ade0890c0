//! Fixed-width text chunking.
//!
//! Widths count characters (Unicode scalar values), so a chunk boundary never
//! falls inside a multi-byte character. Every chunk except the last has
//! exactly `width` characters, the last has between 1 and `width`, and the
//! chunks concatenated in order give back the input unchanged. Empty input
//! yields no chunks.

use std::iter::FusedIterator;
use std::num::NonZeroUsize;

/// Split `text` into consecutive slices of `width` characters.
///
/// The returned iterator borrows `text` and is `Clone`, so the same chunk
/// sequence can be walked more than once.
pub fn chunk_text(text: &str, width: NonZeroUsize) -> Chunks<'_> {
    Chunks { rest: text, width }
}

/// Iterator over fixed-width chunks of a string. See [`chunk_text`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    width: NonZeroUsize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .char_indices()
            .nth(self.width.get())
            .map_or(self.rest.len(), |(i, _)| i);
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.rest.chars().count().div_ceil(self.width.get());
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

impl FusedIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn char_lens(text: &str, width: usize) -> Vec<usize> {
        chunk_text(text, w(width)).map(|c| c.chars().count()).collect()
    }

    #[test]
    fn nine_fifty_by_three_hundred() {
        let text = "a".repeat(950);
        assert_eq!(char_lens(&text, 300), vec![300, 300, 300, 50]);
        assert_eq!(chunk_text(&text, w(300)).len(), 4);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(chunk_text("", w(1)).count(), 0);
        assert_eq!(chunk_text("", w(1024)).len(), 0);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        assert_eq!(char_lens(&"x".repeat(600), 300), vec![300, 300]);
    }

    #[test]
    fn width_larger_than_text_gives_single_chunk() {
        let chunks: Vec<_> = chunk_text("short", w(1024)).collect();
        assert_eq!(chunks, vec!["short"]);
    }

    #[test]
    fn multibyte_characters_are_never_split() {
        let text = "héllo wörld — ñandú 日本語テキスト";
        for width in 1..=8 {
            let chunks: Vec<_> = chunk_text(text, w(width)).collect();
            assert_eq!(chunks.concat(), text);
            let (last, init) = chunks.split_last().unwrap();
            assert!(init.iter().all(|c| c.chars().count() == width));
            assert!((1..=width).contains(&last.chars().count()));
        }
    }

    #[test]
    fn concatenation_reconstructs_input() {
        let texts = [
            "a",
            "The quick brown fox jumps over the lazy dog.",
            "line one\nline two\n\n  indented  ",
        ];
        for text in texts {
            for width in [1, 2, 3, 7, 300] {
                let joined: String = chunk_text(text, w(width)).collect();
                assert_eq!(joined, text, "width {width}");
            }
        }
    }

    #[test]
    fn iterator_is_restartable_and_fused() {
        let chunks = chunk_text("abcdefg", w(3));
        let first: Vec<_> = chunks.clone().collect();
        let second: Vec<_> = chunks.collect();
        assert_eq!(first, vec!["abc", "def", "g"]);
        assert_eq!(first, second);

        let mut it = chunk_text("ab", w(5));
        assert_eq!(it.next(), Some("ab"));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn size_hint_tracks_progress() {
        let mut it = chunk_text("abcdefg", w(3));
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
    }
}
