//! Suffix/prefix overlap between adjacent chunks.
//!
//! Lengths are measured in characters (Unicode scalar values), so a shared
//! multi-byte character counts once and spans are never cut inside one.

/// Returns the largest `L` such that the last `L` characters of `a` equal the
/// first `L` characters of `b`, or 0 if there is none.
///
/// Every candidate length from `min(len(a), len(b))` down to 1 is compared
/// exactly; the first match is the answer.
///
/// # Examples
///
/// ```
/// use chunkbench::analysis::longest_suffix_prefix_overlap;
///
/// assert_eq!(longest_suffix_prefix_overlap("hello world", "world peace"), 5);
/// assert_eq!(longest_suffix_prefix_overlap("abc", "xyz"), 0);
/// ```
#[must_use]
pub fn longest_suffix_prefix_overlap(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max = a.len().min(b.len());

    (1..=max)
        .rev()
        .find(|&len| a[a.len() - len..] == b[..len])
        .unwrap_or(0)
}

/// Same result as [`longest_suffix_prefix_overlap`] in `O(len(a) + len(b))`.
///
/// Runs `b` as a pattern over `a` with its prefix function; the match state
/// left after the last character of `a` is the longest prefix of `b` that is
/// a suffix of `a`.
#[must_use]
pub fn longest_suffix_prefix_overlap_linear(a: &str, b: &str) -> usize {
    let pattern: Vec<char> = b.chars().collect();
    if pattern.is_empty() || a.is_empty() {
        return 0;
    }

    let prefix = prefix_function(&pattern);
    let mut matched = 0;
    for c in a.chars() {
        if matched == pattern.len() {
            matched = prefix[matched - 1];
        }
        while matched > 0 && pattern[matched] != c {
            matched = prefix[matched - 1];
        }
        if pattern[matched] == c {
            matched += 1;
        }
    }
    matched
}

/// `prefix[i]` is the length of the longest proper prefix of
/// `pattern[..=i]` that is also its suffix.
fn prefix_function(pattern: &[char]) -> Vec<usize> {
    let mut prefix = vec![0; pattern.len()];
    let mut k = 0;
    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = prefix[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        prefix[i] = k;
    }
    prefix
}
