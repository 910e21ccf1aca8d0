//! Overlap-resolution merge for streamed answer fragments.
//!
//! The upstream's streaming mode is not contractually fixed: fragments may be
//! cumulative (the whole answer-so-far), pure deltas, or resends that overlap
//! text we already hold. [`merge_by_overlap`] folds all three regimes into
//! one buffer without visible duplication, and [`collapse_repeated_words`]
//! cleans up word stutter a seam can still produce.

/// Upper bound, in characters, on the suffix/prefix overlap scan.
const MAX_OVERLAP_SCAN: usize = 1024;

/// Combines the accumulated answer with one incoming fragment.
///
/// Resolution order:
/// 1. either side empty — take the other;
/// 2. fragment extends the current text (cumulative upstream) — replace;
/// 3. current text already contains the fragment (rollback/duplicate) — keep;
/// 4. longest suffix-of-current == prefix-of-fragment overlap, scanned from
///    `MAX_OVERLAP_SCAN` characters down — append the fragment's remainder;
/// 5. no overlap — plain concatenation.
pub fn merge_by_overlap(current: &str, fragment: &str) -> String {
    if current.is_empty() {
        return fragment.to_owned();
    }
    if fragment.is_empty() {
        return current.to_owned();
    }
    if fragment.starts_with(current) {
        return fragment.to_owned();
    }
    if current.contains(fragment) {
        return current.to_owned();
    }

    // Byte offsets of candidate overlap lengths, respecting UTF-8 boundaries:
    // tail_starts[k-1] is where the last k chars of `current` begin,
    // head_ends[k-1] is just past the first k chars of `fragment`.
    let tail_starts: Vec<usize> = current
        .char_indices()
        .map(|(i, _)| i)
        .rev()
        .take(MAX_OVERLAP_SCAN)
        .collect();
    let head_ends: Vec<usize> = fragment
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take(MAX_OVERLAP_SCAN)
        .collect();

    let max = tail_starts.len().min(head_ends.len());
    for len in (1..=max).rev() {
        let tail = &current[tail_starts[len - 1]..];
        let head = &fragment[..head_ends[len - 1]];
        if tail == head {
            let mut merged = String::with_capacity(current.len() + fragment.len());
            merged.push_str(current);
            merged.push_str(&fragment[head_ends[len - 1]..]);
            return merged;
        }
    }

    let mut merged = String::with_capacity(current.len() + fragment.len());
    merged.push_str(current);
    merged.push_str(fragment);
    merged
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '’'
}

#[derive(Clone, Copy, PartialEq)]
enum RunKind {
    Word,
    Space,
    Other,
}

fn run_kind(c: char) -> RunKind {
    if is_word_char(c) {
        RunKind::Word
    } else if c.is_whitespace() {
        RunKind::Space
    } else {
        RunKind::Other
    }
}

/// Collapses a word immediately repeated across whitespace ("the the cat" →
/// "the cat", any number of repeats) as produced by an overlap seam.
///
/// Words are maximal runs of Unicode alphanumerics plus apostrophes, so
/// scripts written without spaces form one run and pass through untouched.
pub fn collapse_repeated_words(text: &str) -> String {
    // Segment into (kind, slice) runs of uniform character class.
    let mut runs: Vec<(RunKind, &str)> = Vec::new();
    let mut start = 0;
    let mut kind = None;
    for (i, c) in text.char_indices() {
        let k = run_kind(c);
        match kind {
            Some(prev) if prev == k => {}
            Some(prev) => {
                runs.push((prev, &text[start..i]));
                start = i;
                kind = Some(k);
            }
            None => kind = Some(k),
        }
    }
    if let Some(k) = kind {
        runs.push((k, &text[start..]));
    }

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < runs.len() {
        let (kind, slice) = runs[i];
        out.push_str(slice);
        if kind == RunKind::Word {
            // Swallow every immediate `<whitespace><same word>` repeat.
            while let (Some((RunKind::Space, _)), Some((RunKind::Word, next))) =
                (runs.get(i + 1).copied(), runs.get(i + 2).copied())
            {
                if next != slice {
                    break;
                }
                i += 2;
            }
        }
        i += 1;
    }
    out
}
