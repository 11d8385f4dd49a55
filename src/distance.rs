//! Edit-distance primitive behind the "did you mean" suggestions.

/// Minimum number of single-character insertions, deletions, or
/// substitutions transforming `a` into `b`. Case handling is the caller's
/// responsibility. Runs in O(|a|*|b|) time with a rolling two-row table.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let substitution_cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j] + substitution_cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_zero_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("return", "return"), 0);
    }

    #[test]
    fn empty_string_distance_is_the_other_length() {
        assert_eq!(edit_distance("", "loop"), 4);
        assert_eq!(edit_distance("begin", ""), 5);
    }

    #[test]
    fn classic_cases() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("retrun", "return"), 2);
        assert_eq!(edit_distance("whlie", "while"), 2);
        assert_eq!(edit_distance("brk", "break"), 2);
    }

    #[test]
    fn distance_is_symmetric() {
        for (a, b) in [("elif", "else"), ("writeInteger", "writeByte"), ("x", "xyz")] {
            assert_eq!(edit_distance(a, b), edit_distance(b, a));
        }
    }

    #[test]
    fn multibyte_characters_count_as_single_edits() {
        assert_eq!(edit_distance("café", "cafe"), 1);
        assert_eq!(edit_distance("αβγ", "αβδ"), 1);
    }
}
