//! Candidate-substitution heuristic (§4.3 step 6), resolved from the
//! original implementation's exact character-index logic rather than the
//! self-contradictory prose in the distilled specification.
//!
//! A plate has the "two-letter, rest-numeric" shape when its first two
//! characters are both non-digits and every character from index 2 onward
//! is a digit. Substitution is attempted only when the decision's current
//! plate does *not* already have that shape; the first candidate that *does*
//! have it is adopted.

use crate::reading::Candidate;

fn has_two_letter_shape(plate: &str) -> bool {
    let chars: Vec<char> = plate.chars().collect();
    if chars.len() < 3 {
        return false;
    }
    let leading_ok = !chars[0].is_ascii_digit() && !chars[1].is_ascii_digit();
    let rest_numeric = chars[2..].iter().all(|c| c.is_ascii_digit());
    leading_ok && rest_numeric
}

fn eligible_for_substitution(plate: &str) -> bool {
    let len = plate.chars().count();
    if !(3..=8).contains(&len) {
        return false;
    }
    if plate.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    !has_two_letter_shape(plate)
}

/// Returns the substitute plate, if any candidate qualifies.
pub fn find_candidate(plate: &str, candidates: &[Candidate]) -> Option<String> {
    if !eligible_for_substitution(plate) {
        return None;
    }
    candidates
        .iter()
        .find(|c| has_two_letter_shape(&c.plate))
        .map(|c| c.plate.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(plate: &str) -> Candidate {
        Candidate {
            plate: plate.to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn substitutes_when_best_plate_is_not_two_letter_shaped() {
        let candidates = vec![cand("BB1234"), cand("1B1234")];
        assert_eq!(find_candidate("1B1234", &candidates), Some("BB1234".to_string()));
    }

    #[test]
    fn no_substitution_when_already_two_letter_shaped() {
        let candidates = vec![cand("XY1234")];
        assert_eq!(find_candidate("AB1234", &candidates), None);
    }

    #[test]
    fn no_substitution_for_purely_numeric_plate() {
        let candidates = vec![cand("AB1234")];
        assert_eq!(find_candidate("123456", &candidates), None);
    }

    #[test]
    fn no_substitution_when_no_candidate_qualifies() {
        let candidates = vec![cand("1B1234"), cand("2C5678")];
        assert_eq!(find_candidate("1B1234", &candidates), None);
    }
}
