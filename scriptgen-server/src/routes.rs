//! HTTP route handlers for the generation API.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use scriptgen::api::{GenerateRequest, HearingTurnRequest, handle_generate, handle_hearing_turn};
use scriptgen::core::types::GenerationResult;
use scriptgen::hearing::HearingTurn;
use serde::Serialize;
use tokio::task;
use tracing::{error, warn};

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/hearing", post(hearing))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

async fn health() -> &'static str {
    "ok"
}

/// POST /api/generate - run the bounded generation loop.
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationResult>, ApiError> {
    if let Err(err) = request.validate() {
        warn!(err = %err, "rejecting generate request");
        return Err(api_error(StatusCode::BAD_REQUEST, err.to_string()));
    }
    let oracle = state.generation.clone();
    let result = task::spawn_blocking(move || handle_generate(&*oracle, &request))
        .await
        .map_err(|err| {
            error!(err = %err, "generation worker failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "generation worker failed")
        })?;
    Ok(Json(result))
}

/// POST /api/hearing - ask for the next hearing question.
async fn hearing(
    State(state): State<AppState>,
    Json(request): Json<HearingTurnRequest>,
) -> Result<Json<HearingTurn>, ApiError> {
    if let Err(err) = request.validate() {
        warn!(err = %err, "rejecting hearing request");
        return Err(api_error(StatusCode::BAD_REQUEST, err.to_string()));
    }
    let oracle = state.dialogue.clone();
    let turn = task::spawn_blocking(move || handle_hearing_turn(&*oracle, &request))
        .await
        .map_err(|err| {
            error!(err = %err, "hearing worker failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "hearing worker failed")
        })?;
    Ok(Json(turn))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scriptgen::core::types::{CtaIntent, DialogueTurn};
    use scriptgen::io::dialogue_oracle::{DialogueOracle, DialogueReply};
    use scriptgen::io::oracle::{GenerationOracle, OracleResponse};
    use scriptgen::test_support::{
        ScriptedDialogueOracle, ScriptedOracle, ScriptedReply, candidate_with_len,
        sample_transcript,
    };

    use super::*;

    fn state_with(oracle: ScriptedOracle, dialogue: ScriptedDialogueOracle) -> AppState {
        AppState::new(Arc::new(oracle), Arc::new(dialogue))
    }

    fn generate_request(topic: &str, history: Option<Vec<DialogueTurn>>) -> GenerateRequest {
        GenerateRequest {
            topic: topic.to_string(),
            cta_purpose: CtaIntent::Like,
            history,
        }
    }

    struct PanickingOracle;

    impl GenerationOracle for PanickingOracle {
        fn generate(&self, _prompt: &str) -> OracleResponse {
            panic!("oracle blew up");
        }
    }

    impl DialogueOracle for PanickingOracle {
        fn ask(&self, _prompt: &str) -> DialogueReply {
            panic!("oracle blew up");
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn generate_returns_script() {
        let candidate = candidate_with_len(300, "いいねお願いします");
        let state = state_with(
            ScriptedOracle::new(vec![ScriptedReply::Script(candidate.clone())]),
            ScriptedDialogueOracle::new(Vec::new()),
        );

        let Json(result) = generate(State(state), Json(generate_request("morning routines", None)))
            .await
            .expect("generate");

        assert!(result.success);
        assert_eq!(result.script, Some(candidate));
    }

    /// The dialogue-aware path embeds hearing answers in the prompt.
    #[tokio::test]
    async fn generate_with_history_uses_hearing_answers() {
        let oracle = Arc::new(ScriptedOracle::new(vec![ScriptedReply::Script(
            candidate_with_len(300, "いいねお願いします"),
        )]));
        let state = AppState::new(
            oracle.clone(),
            Arc::new(ScriptedDialogueOracle::new(Vec::new())),
        );

        let Json(result) = generate(
            State(state),
            Json(generate_request("morning routines", Some(sample_transcript()))),
        )
        .await
        .expect("generate");

        assert!(result.success);
        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("朝5時に起きると一日が変わる"));
    }

    #[tokio::test]
    async fn generate_blank_topic_is_bad_request() {
        let state = state_with(
            ScriptedOracle::new(Vec::new()),
            ScriptedDialogueOracle::new(Vec::new()),
        );

        let (status, Json(body)) = generate(State(state), Json(generate_request(" ", None)))
            .await
            .expect_err("blank topic");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("topic"));
    }

    #[tokio::test]
    async fn generate_oracle_panic_is_internal_error() {
        let state = AppState::new(
            Arc::new(PanickingOracle),
            Arc::new(ScriptedDialogueOracle::new(Vec::new())),
        );

        let (status, _) = generate(State(state), Json(generate_request("morning routines", None)))
            .await
            .expect_err("panic");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn hearing_returns_oracle_question() {
        let state = state_with(
            ScriptedOracle::new(Vec::new()),
            ScriptedDialogueOracle::new(vec![DialogueReply::Question(
                "毎朝何時に起きていますか？".to_string(),
            )]),
        );
        let request = HearingTurnRequest {
            topic: "morning routines".to_string(),
            history: Vec::new(),
        };

        let Json(turn) = hearing(State(state), Json(request)).await.expect("hearing");

        assert_eq!(
            turn,
            HearingTurn::Question {
                content: "毎朝何時に起きていますか？".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn hearing_oracle_failure_is_error_turn() {
        let state = state_with(
            ScriptedOracle::new(Vec::new()),
            ScriptedDialogueOracle::new(vec![DialogueReply::Error(
                "timed out after 120s".to_string(),
            )]),
        );
        let request = HearingTurnRequest {
            topic: "morning routines".to_string(),
            history: sample_transcript(),
        };

        let Json(turn) = hearing(State(state), Json(request)).await.expect("hearing");

        assert_eq!(
            turn,
            HearingTurn::Error {
                error: "timed out after 120s".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn hearing_panic_is_internal_error() {
        let state = AppState::new(
            Arc::new(ScriptedOracle::new(Vec::new())),
            Arc::new(PanickingOracle),
        );
        let request = HearingTurnRequest {
            topic: "morning routines".to_string(),
            history: Vec::new(),
        };

        let (status, _) = hearing(State(state), Json(request)).await.expect_err("panic");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn router_builds() {
        let _router: Router<AppState> = api_router();
    }
}
