//! Corrective directives appended to a prompt after a rejected attempt.

use crate::core::types::{
    CtaIntent, MAX_SCRIPT_CHARS, MIN_SCRIPT_CHARS, ValidationError, ValidationErrorCode,
};

/// Heading that opens every correction block.
pub const CORRECTION_HEADING: &str = "## 修正指示";

/// Append one directive per distinct violated code to `prompt`.
///
/// Directives appear in first-occurrence order. The block is appended to the
/// prompt as given, so corrections from earlier attempts are kept.
pub fn append_corrections(
    prompt: &str,
    errors: &[ValidationError],
    measured_length: usize,
) -> String {
    let mut seen: Vec<ValidationErrorCode> = Vec::new();
    for err in errors {
        if !seen.contains(&err.code) {
            seen.push(err.code);
        }
    }

    let mut adjusted = String::with_capacity(prompt.len() + 256);
    adjusted.push_str(prompt.trim_end());
    adjusted.push_str("\n\n");
    adjusted.push_str(CORRECTION_HEADING);
    adjusted.push_str(
        "\n前回の出力は以下の点で要件を満たしていませんでした。すべて修正して、JSONのみを再出力してください。\n",
    );
    for code in seen {
        adjusted.push_str("- ");
        adjusted.push_str(&directive(code, measured_length));
        adjusted.push('\n');
    }
    adjusted
}

fn directive(code: ValidationErrorCode, measured_length: usize) -> String {
    match code {
        ValidationErrorCode::MissingHook => {
            "hook（冒頭のつかみ）が空です。必ず内容のある hook を出力してください。".to_string()
        }
        ValidationErrorCode::MissingBody => {
            "body（本題）が空です。必ず内容のある body を出力してください。".to_string()
        }
        ValidationErrorCode::MissingCta => {
            "cta（行動喚起）が空です。必ず内容のある cta を出力してください。".to_string()
        }
        ValidationErrorCode::MalformedOrder => {
            "フィールドの順序が崩れています。hook, context, body, proof, transition, cta の順に構成してください。".to_string()
        }
        ValidationErrorCode::ContainsEmoji => {
            "絵文字が含まれています。絵文字や記号の装飾を一切使わないでください。".to_string()
        }
        ValidationErrorCode::TooShort => {
            let shortfall = MIN_SCRIPT_CHARS.saturating_sub(measured_length);
            format!(
                "文字数が{measured_length}文字で、{shortfall}文字不足しています。合計{MIN_SCRIPT_CHARS}〜{MAX_SCRIPT_CHARS}文字になるよう、少なくとも{shortfall}文字分の具体的な内容を追加してください。"
            )
        }
        ValidationErrorCode::TooLong => {
            let excess = measured_length.saturating_sub(MAX_SCRIPT_CHARS);
            format!(
                "文字数が{measured_length}文字で、{excess}文字超過しています。合計{MIN_SCRIPT_CHARS}〜{MAX_SCRIPT_CHARS}文字になるよう、少なくとも{excess}文字削ってください。"
            )
        }
        ValidationErrorCode::CtaMismatchLongVideo => cta_directive(CtaIntent::LongVideo),
        ValidationErrorCode::CtaMismatchLike => cta_directive(CtaIntent::Like),
        ValidationErrorCode::CtaMismatchComment => cta_directive(CtaIntent::Comment),
    }
}

fn cta_directive(intent: CtaIntent) -> String {
    let keywords = intent
        .keywords()
        .iter()
        .map(|keyword| format!("「{keyword}」"))
        .collect::<String>();
    format!("cta が目的に合っていません。cta には {keywords} のいずれかを必ず含めてください。")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(code: ValidationErrorCode) -> ValidationError {
        ValidationError::new(code, code.as_str())
    }

    #[test]
    fn shortfall_is_interpolated() {
        let adjusted = append_corrections(
            "base prompt",
            &[
                err(ValidationErrorCode::TooShort),
                err(ValidationErrorCode::CtaMismatchLike),
            ],
            230,
        );
        assert!(adjusted.starts_with("base prompt\n\n## 修正指示"));
        assert!(adjusted.contains("20文字不足"), "{adjusted}");
        assert!(adjusted.contains("「いいね」「高評価」「グッド」"));
    }

    #[test]
    fn excess_is_interpolated() {
        let adjusted = append_corrections("p", &[err(ValidationErrorCode::TooLong)], 415);
        assert!(adjusted.contains("15文字超過"), "{adjusted}");
    }

    /// Repeated codes produce a single directive.
    #[test]
    fn one_directive_per_distinct_code() {
        let adjusted = append_corrections(
            "p",
            &[
                err(ValidationErrorCode::ContainsEmoji),
                err(ValidationErrorCode::ContainsEmoji),
            ],
            300,
        );
        assert_eq!(adjusted.matches("絵文字が含まれています").count(), 1);
    }

    /// A second round appends to the already-adjusted prompt.
    #[test]
    fn corrections_accumulate() {
        let first = append_corrections("p", &[err(ValidationErrorCode::MissingHook)], 300);
        let second = append_corrections(&first, &[err(ValidationErrorCode::MissingCta)], 300);
        assert_eq!(second.matches(CORRECTION_HEADING).count(), 2);
        assert!(second.contains("hook（冒頭のつかみ）が空です"));
        assert!(second.contains("cta（行動喚起）が空です"));
    }
}
