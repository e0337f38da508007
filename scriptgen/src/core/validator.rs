//! Structural and stylistic checks for generated script candidates.
//!
//! Every check runs unconditionally and all failures are collected; the
//! validator never stops at the first violation.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::{
    CtaIntent, MAX_SCRIPT_CHARS, MIN_SCRIPT_CHARS, ScriptCandidate, ValidationError,
    ValidationErrorCode, ValidationResult,
};

/// Pictographic ranges: emoticons, symbols and pictographs, transport, supplemental
/// symbols, misc symbols, dingbats, enclosed alphanumerics and ideographs, the
/// star and circle from misc arrows, variation selectors and regional indicators.
static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F300}-\x{1F5FF}",
        r"\x{1F600}-\x{1F64F}",
        r"\x{1F680}-\x{1F6FF}",
        r"\x{1F700}-\x{1F77F}",
        r"\x{1F900}-\x{1F9FF}",
        r"\x{1FA70}-\x{1FAFF}",
        r"\x{2600}-\x{26FF}",
        r"\x{2700}-\x{27BF}",
        r"\x{2B50}\x{2B55}",
        r"\x{3030}\x{303D}",
        r"\x{FE00}-\x{FE0F}",
        r"\x{1F100}-\x{1F1FF}",
        r"\x{1F200}-\x{1F2FF}",
        "]"
    ))
    .expect("emoji pattern should be valid")
});

/// Validate a candidate against the structure, emoji, length and CTA rules.
pub fn validate_script(candidate: &ScriptCandidate, intent: CtaIntent) -> ValidationResult {
    let mut errors = Vec::new();

    check_required(&candidate.hook, ValidationErrorCode::MissingHook, "hook", &mut errors);
    check_required(&candidate.body, ValidationErrorCode::MissingBody, "body", &mut errors);
    check_required(&candidate.cta, ValidationErrorCode::MissingCta, "cta", &mut errors);

    let full_text = candidate.full_text();
    if contains_emoji(&full_text) {
        errors.push(ValidationError::new(
            ValidationErrorCode::ContainsEmoji,
            "script must not contain emoji",
        ));
    }

    let length = full_text.chars().count();
    if length < MIN_SCRIPT_CHARS {
        errors.push(ValidationError::new(
            ValidationErrorCode::TooShort,
            format!("script is {length} characters (minimum {MIN_SCRIPT_CHARS})"),
        ));
    } else if length > MAX_SCRIPT_CHARS {
        errors.push(ValidationError::new(
            ValidationErrorCode::TooLong,
            format!("script is {length} characters (maximum {MAX_SCRIPT_CHARS})"),
        ));
    }

    if !cta_matches_intent(&candidate.cta, intent) {
        errors.push(ValidationError::new(
            intent.mismatch_code(),
            format!(
                "cta must contain one of {} for intent {intent}",
                intent.keywords().join(" / ")
            ),
        ));
    }

    ValidationResult::from_errors(errors)
}

/// Whether any character of `text` falls in a pictographic range.
pub fn contains_emoji(text: &str) -> bool {
    EMOJI_RE.is_match(text)
}

/// Case-sensitive substring match against the intent's keyword set.
pub fn cta_matches_intent(cta: &str, intent: CtaIntent) -> bool {
    intent.keywords().iter().any(|keyword| cta.contains(keyword))
}

fn check_required(
    value: &str,
    code: ValidationErrorCode,
    field: &str,
    errors: &mut Vec<ValidationError>,
) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(code, format!("{field} is required")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candidate_with_len, script};

    fn codes(result: &ValidationResult) -> Vec<ValidationErrorCode> {
        result.errors.iter().map(|err| err.code).collect()
    }

    /// A well-formed 300-character like-script passes every check.
    #[test]
    fn valid_script_has_no_errors() {
        let candidate = candidate_with_len(300, "いいねお願いします");
        let result = validate_script(&candidate, CtaIntent::Like);
        assert!(result.valid, "unexpected errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    /// Every missing required field is reported with its own code, alongside
    /// the length and CTA failures (no short-circuit).
    #[test]
    fn reports_all_missing_fields_and_keeps_going() {
        let candidate = script("  ", "", "\n");
        let result = validate_script(&candidate, CtaIntent::Comment);
        assert_eq!(
            codes(&result),
            vec![
                ValidationErrorCode::MissingHook,
                ValidationErrorCode::MissingBody,
                ValidationErrorCode::MissingCta,
                ValidationErrorCode::TooShort,
                ValidationErrorCode::CtaMismatchComment,
            ]
        );
        assert!(!result.valid);
    }

    /// Length flips exactly at the 249/250 and 400/401 edges.
    #[test]
    fn length_bounds_are_inclusive() {
        let at = |len: usize| validate_script(&candidate_with_len(len, "高評価"), CtaIntent::Like);

        assert!(at(249).has(ValidationErrorCode::TooShort));
        assert!(at(250).valid);
        assert!(at(400).valid);
        assert!(at(401).has(ValidationErrorCode::TooLong));
        assert!(!at(401).has(ValidationErrorCode::TooShort));
    }

    /// Measured length is carried in the diagnostic message.
    #[test]
    fn length_errors_carry_measured_count() {
        let result = validate_script(&candidate_with_len(230, "いいね"), CtaIntent::Like);
        let err = result
            .errors
            .iter()
            .find(|err| err.code == ValidationErrorCode::TooShort)
            .expect("too short");
        assert!(err.message.contains("230"), "{}", err.message);
    }

    /// Many emoji still produce a single error.
    #[test]
    fn emoji_reported_once() {
        let mut candidate = candidate_with_len(300, "いいね");
        candidate.hook.push('😀');
        candidate.body.push('🚀');
        candidate.cta.push('✨');
        let result = validate_script(&candidate, CtaIntent::Like);
        let emoji_errors = result
            .errors
            .iter()
            .filter(|err| err.code == ValidationErrorCode::ContainsEmoji)
            .count();
        assert_eq!(emoji_errors, 1);
    }

    /// Optional fields are part of the emoji scan and the length.
    #[test]
    fn optional_fields_are_scanned() {
        let mut candidate = candidate_with_len(300, "いいね");
        candidate.transition = Some("🇯🇵".to_string());
        let result = validate_script(&candidate, CtaIntent::Like);
        assert!(result.has(ValidationErrorCode::ContainsEmoji));
        // Two regional indicators push 300 to 302, still inside the window.
        assert!(!result.has(ValidationErrorCode::TooLong));
    }

    #[test]
    fn variation_selector_counts_as_emoji() {
        assert!(contains_emoji("ok\u{FE0F}"));
        assert!(contains_emoji("☀"));
        assert!(!contains_emoji("朝のルーティン！→ 三つのコツ"));
    }

    #[test]
    fn star_and_enclosed_symbols_count_as_emoji() {
        assert!(contains_emoji("今日のポイント⭐"));
        assert!(contains_emoji("⭕ 正解"));
        assert!(contains_emoji("🆗"));
        assert!(contains_emoji("🈚料"));
        assert!(contains_emoji("〽"));
        assert!(!contains_emoji("朝〜夜まで「三つ」のコツ"));
    }

    /// Emoji detection over the concatenation equals detection over any single field.
    #[test]
    fn emoji_detection_is_monotone_under_concatenation() {
        let samples = ["", "plain", "絵文字なし", "🎉", "a✂b", "x\u{FE0F}", "🇺"];
        for hook in samples {
            for body in samples {
                for cta in samples {
                    let candidate = script(hook, body, cta);
                    let whole = contains_emoji(&candidate.full_text());
                    let any_field = [hook, body, cta].iter().any(|f| contains_emoji(f));
                    assert_eq!(whole, any_field, "hook={hook:?} body={body:?} cta={cta:?}");
                }
            }
        }
    }

    /// Only the cta field is searched for intent keywords.
    #[test]
    fn cta_keyword_must_be_in_cta_field() {
        let mut candidate = candidate_with_len(300, "チャンネル登録してね");
        candidate.body = format!("いいね{}", candidate.body.chars().skip(3).collect::<String>());
        candidate.hook = "いいねの話".to_string();
        let result = validate_script(&candidate, CtaIntent::Like);
        assert!(result.has(ValidationErrorCode::CtaMismatchLike));
    }

    #[test]
    fn each_intent_accepts_its_keywords() {
        assert!(cta_matches_intent("続きは本編で", CtaIntent::LongVideo));
        assert!(cta_matches_intent("フル版はこちら", CtaIntent::LongVideo));
        assert!(cta_matches_intent("グッドボタンを", CtaIntent::Like));
        assert!(cta_matches_intent("感想を教えてください", CtaIntent::Comment));
        assert!(!cta_matches_intent("感想を教えてください", CtaIntent::Like));
    }

    #[test]
    fn mismatch_code_follows_intent() {
        let candidate = candidate_with_len(300, "またね");
        for (intent, code) in [
            (CtaIntent::LongVideo, ValidationErrorCode::CtaMismatchLongVideo),
            (CtaIntent::Like, ValidationErrorCode::CtaMismatchLike),
            (CtaIntent::Comment, ValidationErrorCode::CtaMismatchComment),
        ] {
            assert_eq!(codes(&validate_script(&candidate, intent)), vec![code]);
        }
    }
}
