//! Approximate spelling correction against the index vocabulary.
//!
//! Similarity is the Ratcliff/Obershelp ratio `2 * M / (|a| + |b|)`, where `M`
//! is the number of characters covered by the recursively found longest
//! common blocks of the two words.

use std::collections::HashMap;

use crate::config::SPELL_CORRECTION_CUTOFF;

/// Map `token` to the closest vocabulary term.
///
/// An exact vocabulary hit is returned unchanged. Otherwise the best scoring
/// term whose ratio reaches [`SPELL_CORRECTION_CUTOFF`] wins, ties going to
/// the lexicographically greater term; with no such term the token is kept.
pub fn correct_term<'a, I>(token: &str, vocabulary: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let word: Vec<char> = token.chars().collect();
    let matcher = Matcher::new(&word);
    let mut best: Option<(f64, &String)> = None;

    for candidate in vocabulary {
        if candidate == token {
            return token.to_string();
        }
        let chars: Vec<char> = candidate.chars().collect();
        if quick_upper_bound(chars.len(), word.len()) < SPELL_CORRECTION_CUTOFF {
            continue;
        }
        let score = matcher.ratio(&chars);
        if score < SPELL_CORRECTION_CUTOFF {
            continue;
        }
        let better = match best {
            None => true,
            Some((s, t)) => score > s || (score == s && candidate > t),
        };
        if better {
            best = Some((score, candidate));
        }
    }

    match best {
        Some((_, term)) => term.clone(),
        None => token.to_string(),
    }
}

/// Similarity ratio of two strings in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    Matcher::new(&b).ratio(&a)
}

// Ratio upper bound from lengths alone.
fn quick_upper_bound(la: usize, lb: usize) -> f64 {
    let total = la + lb;
    if total == 0 {
        return 1.0;
    }
    2.0 * la.min(lb) as f64 / total as f64
}

/// Matcher with the fixed word indexed once, compared against many candidates.
struct Matcher<'w> {
    b: &'w [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'w> Matcher<'w> {
    fn new(b: &'w [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        Self { b, b2j }
    }

    fn ratio(&self, a: &[char]) -> f64 {
        let total = a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * self.matching_chars(a) as f64 / total as f64
    }

    fn matching_chars(&self, a: &[char]) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges; among
    /// equally long blocks the one starting earliest in `a`, then in `b`.
    fn longest_match(&self, a: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = j.checked_sub(1).and_then(|p| run_ending_at.get(&p)).copied().unwrap_or(0);
                    let k = prev + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            run_ending_at = next;
        }
        (best_i, best_j, best_k)
    }
}
