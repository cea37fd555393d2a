/*
 * suggest.rs
 * Copyright (c) 2025 Trellis Developers
 */

//! "Did you mean" suggestions for misspelled names.

/// The closest candidate to `name`, if any is within edit distance 3.
///
/// Comparison is case-insensitive; ties keep the first candidate seen.
pub(crate) fn closest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let name_lower = name.to_lowercase();
    let mut best: Option<(&str, usize)> = None;

    for candidate in candidates {
        let dist = levenshtein_distance(&name_lower, &candidate.to_lowercase());
        if dist > 3 {
            continue;
        }
        match best {
            Some((_, best_dist)) if best_dist <= dist => {}
            _ => best = Some((candidate, dist)),
        }
    }

    best.map(|(s, _)| s.to_string())
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("func", "func"), 0);
    }

    #[test]
    fn test_closest_is_case_insensitive() {
        let names = ["Func", "StaticFunc", "DynFunc", "SelfFunc"];
        assert_eq!(closest("fnuc", names), Some("Func".to_string()));
        assert_eq!(closest("DynFun", names), Some("DynFunc".to_string()));
        assert_eq!(closest("Completely", names), None);
    }
}
