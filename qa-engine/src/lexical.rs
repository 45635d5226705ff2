//! Lexical similarity between normalized questions.

/// String-similarity metric in `0..=100` between two normalized strings.
///
/// Implement this to swap the edit-distance algorithm without touching the
/// matching policy.
pub trait LexicalScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Indel-distance ratio (insertions and deletions only), the classic fuzzy
/// "ratio": `100 * (|a| + |b| - indel(a, b)) / (|a| + |b|)`, rounded.
///
/// Two empty strings are identical (100).
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl LexicalScorer for IndelRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let total = a.len() + b.len();
        if total == 0 {
            return 100;
        }

        // indel(a, b) = |a| + |b| - 2 * lcs(a, b)
        let lcs = lcs_len(&a, &b);
        let ratio = (2 * lcs) as f64 / total as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Longest common subsequence length with two rolling rows.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(IndelRatio.score("what is your name", "what is your name"), 100);
        assert_eq!(IndelRatio.score("", ""), 100);
    }

    #[test]
    fn disjoint_strings_score_0() {
        assert_eq!(IndelRatio.score("abc", "xyz"), 0);
        assert_eq!(IndelRatio.score("abc", ""), 0);
    }

    #[test]
    fn partial_overlap() {
        // lcs("kitten", "sitting") = "ittn" -> 2*4/13 = 61.5%
        assert_eq!(IndelRatio.score("kitten", "sitting"), 62);
        // one missing char out of 17 + 16
        assert_eq!(IndelRatio.score("what is your name", "what is you name"), 97);
    }

    #[test]
    fn is_symmetric() {
        let pairs = [("how old are you", "how are you"), ("hi", "hello there")];
        for (a, b) in pairs {
            assert_eq!(IndelRatio.score(a, b), IndelRatio.score(b, a));
        }
    }
}
