//! Soundex phonetic codes and the code → terms map used for query expansion.

use std::collections::BTreeMap;

use crate::index::DictEntry;

/// Soundex code → vocabulary terms sharing it, in dictionary order.
pub type PhoneticMap = BTreeMap<String, Vec<String>>;

fn class_of(c: char) -> char {
    match c {
        'B' | 'F' | 'P' | 'V' => '1',
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => '2',
        'D' | 'T' => '3',
        'L' => '4',
        'M' | 'N' => '5',
        'R' => '6',
        _ => '0',
    }
}

/// Compute the 4-character soundex code of `term`.
///
/// The first character is kept verbatim. Each later letter with a phonetic
/// class is appended unless it repeats the last character appended so far;
/// vowels, `H`, `W`, `Y` and digits are never appended. Empty input yields an
/// empty string.
pub fn soundex(term: &str) -> String {
    let upper = term.to_uppercase();
    let mut chars = upper.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return String::new(),
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut last = first;
    for c in chars {
        let digit = class_of(c);
        if digit != '0' && digit != last {
            code.push(digit);
            last = digit;
        }
    }

    let mut code: String = code.chars().filter(|&c| c != '0').collect();
    while code.chars().count() < 4 {
        code.push('0');
    }
    code.chars().take(4).collect()
}

/// Group every dictionary term under its soundex code.
pub fn precompute_soundex_map(dictionary: &BTreeMap<String, DictEntry>) -> PhoneticMap {
    let mut map = PhoneticMap::new();
    for term in dictionary.keys() {
        map.entry(soundex(term)).or_default().push(term.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_reference_pairs() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("robert"), "R163");
    }

    #[test]
    fn empty_term() {
        assert_eq!(soundex(""), "");
    }

    #[test]
    fn pads_and_truncates_to_four() {
        assert_eq!(soundex("a"), "A000");
        assert_eq!(soundex("lee"), "L000");
        assert_eq!(soundex("washington"), "W252");
    }

    #[test]
    fn adjacent_duplicates_collapse() {
        // "ck" share class 2 and collapse into one digit
        assert_eq!(soundex("jackson"), "J250");
        // a vowel does not separate two equal classes
        assert_eq!(soundex("tymczak"), "T520");
        // the first letter is compared as itself, not as its class
        assert_eq!(soundex("bob"), "B100");
    }

    #[test]
    fn digits_carry_no_class() {
        assert_eq!(soundex("4x4"), "4200");
        assert_eq!(soundex("2024"), "2000");
    }

    #[test]
    fn map_groups_terms_by_code() {
        let mut dict = BTreeMap::new();
        for t in ["robert", "rupert", "cat"] {
            dict.insert(t.to_string(), DictEntry::default());
        }
        let map = precompute_soundex_map(&dict);
        assert_eq!(map.get("R163"), Some(&vec!["robert".to_string(), "rupert".to_string()]));
        assert_eq!(map.get("C300"), Some(&vec!["cat".to_string()]));
        assert_eq!(map.values().map(Vec::len).sum::<usize>(), 3);
    }
}
