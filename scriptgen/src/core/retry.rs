//! Retry planning for rejected candidates.
//!
//! Decides whether a validation failure can be fixed by re-prompting, needs
//! more source material from the user, or should not be retried at all.

use serde::{Deserialize, Serialize};

use crate::core::types::{MAX_SCRIPT_CHARS, MIN_SCRIPT_CHARS, ValidationError, ValidationErrorCode};

/// Largest length gap (in characters) that a corrective re-prompt is expected to close.
pub const LENGTH_RETRY_TOLERANCE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryAction {
    RetryWithAdjustedPrompt,
    RequestMoreInformation,
    NoRetry,
}

/// Planner output. `shortfall`/`excess` are only set by the length rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryDecision {
    pub action: RetryAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess: Option<usize>,
}

impl RetryDecision {
    fn plain(action: RetryAction) -> Self {
        Self {
            action,
            shortfall: None,
            excess: None,
        }
    }

    fn from_gap(gap: usize) -> RetryAction {
        if gap <= LENGTH_RETRY_TOLERANCE {
            RetryAction::RetryWithAdjustedPrompt
        } else {
            RetryAction::RequestMoreInformation
        }
    }
}

/// Decide how to react to `errors` given the candidate's measured length.
///
/// Rules, first match wins:
/// 1. too short: retry when the shortfall is within tolerance, else ask for more info.
/// 2. too long: same, using the excess.
/// 3. any retryable code: retry with no length adjustment.
/// 4. otherwise: no retry.
pub fn determine_retry_action(errors: &[ValidationError], measured_length: usize) -> RetryDecision {
    let has = |code: ValidationErrorCode| errors.iter().any(|err| err.code == code);

    if has(ValidationErrorCode::TooShort) {
        let shortfall = MIN_SCRIPT_CHARS.saturating_sub(measured_length);
        return RetryDecision {
            action: RetryDecision::from_gap(shortfall),
            shortfall: Some(shortfall),
            excess: None,
        };
    }

    if has(ValidationErrorCode::TooLong) {
        let excess = measured_length.saturating_sub(MAX_SCRIPT_CHARS);
        return RetryDecision {
            action: RetryDecision::from_gap(excess),
            shortfall: None,
            excess: Some(excess),
        };
    }

    if errors.iter().any(|err| err.code.is_retryable()) {
        return RetryDecision::plain(RetryAction::RetryWithAdjustedPrompt);
    }

    RetryDecision::plain(RetryAction::NoRetry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(codes: &[ValidationErrorCode]) -> Vec<ValidationError> {
        codes
            .iter()
            .map(|code| ValidationError::new(*code, code.as_str()))
            .collect()
    }

    #[test]
    fn small_shortfall_retries() {
        let decision = determine_retry_action(&errors(&[ValidationErrorCode::TooShort]), 242);
        assert_eq!(decision.action, RetryAction::RetryWithAdjustedPrompt);
        assert_eq!(decision.shortfall, Some(8));
        assert_eq!(decision.excess, None);
    }

    #[test]
    fn large_shortfall_requests_more_information() {
        let decision = determine_retry_action(&errors(&[ValidationErrorCode::TooShort]), 180);
        assert_eq!(decision.action, RetryAction::RequestMoreInformation);
        assert_eq!(decision.shortfall, Some(70));
    }

    #[test]
    fn small_excess_retries() {
        let decision = determine_retry_action(&errors(&[ValidationErrorCode::TooLong]), 415);
        assert_eq!(decision.action, RetryAction::RetryWithAdjustedPrompt);
        assert_eq!(decision.excess, Some(15));
        assert_eq!(decision.shortfall, None);
    }

    #[test]
    fn large_excess_requests_more_information() {
        let decision = determine_retry_action(&errors(&[ValidationErrorCode::TooLong]), 480);
        assert_eq!(decision.action, RetryAction::RequestMoreInformation);
        assert_eq!(decision.excess, Some(80));
    }

    /// A gap of exactly the tolerance is still retried.
    #[test]
    fn tolerance_boundary_is_inclusive() {
        let short = determine_retry_action(&errors(&[ValidationErrorCode::TooShort]), 200);
        assert_eq!(short.action, RetryAction::RetryWithAdjustedPrompt);
        let short = determine_retry_action(&errors(&[ValidationErrorCode::TooShort]), 199);
        assert_eq!(short.action, RetryAction::RequestMoreInformation);

        let long = determine_retry_action(&errors(&[ValidationErrorCode::TooLong]), 450);
        assert_eq!(long.action, RetryAction::RetryWithAdjustedPrompt);
        let long = determine_retry_action(&errors(&[ValidationErrorCode::TooLong]), 451);
        assert_eq!(long.action, RetryAction::RequestMoreInformation);
    }

    /// Length rules take priority over other retryable codes in the same list.
    #[test]
    fn length_rule_wins_over_field_errors() {
        let decision = determine_retry_action(
            &errors(&[
                ValidationErrorCode::ContainsEmoji,
                ValidationErrorCode::TooShort,
                ValidationErrorCode::CtaMismatchLike,
            ]),
            100,
        );
        assert_eq!(decision.action, RetryAction::RequestMoreInformation);
        assert_eq!(decision.shortfall, Some(150));
    }

    #[test]
    fn field_errors_retry_without_length_adjustment() {
        for code in [
            ValidationErrorCode::MissingHook,
            ValidationErrorCode::MissingBody,
            ValidationErrorCode::MissingCta,
            ValidationErrorCode::MalformedOrder,
            ValidationErrorCode::ContainsEmoji,
            ValidationErrorCode::CtaMismatchLongVideo,
            ValidationErrorCode::CtaMismatchLike,
            ValidationErrorCode::CtaMismatchComment,
        ] {
            let decision = determine_retry_action(&errors(&[code]), 300);
            assert_eq!(
                decision,
                RetryDecision {
                    action: RetryAction::RetryWithAdjustedPrompt,
                    shortfall: None,
                    excess: None,
                },
                "code {code}"
            );
        }
    }

    #[test]
    fn no_errors_means_no_retry() {
        let decision = determine_retry_action(&[], 300);
        assert_eq!(decision.action, RetryAction::NoRetry);
    }
}
