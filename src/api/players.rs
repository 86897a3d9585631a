// Player submission endpoint: validate, analyze, respond.

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use super::{bad_json, json_error, json_error_details, AppState};
use crate::analysis::{self, Analysis};
use crate::metrics;
use crate::player::{PlayerProfile, ProfileError};

pub const ANALYZED_MESSAGE: &str = "Player information processed successfully";
pub const FALLBACK_MESSAGE: &str = "Player information processed with mock data (API unavailable)";

/// Body of a 201 response from `POST /api/players`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnalysisResponse {
    pub success: bool,
    pub message: &'static str,
    pub analysis: String,
    /// `"model"` or `"fallback"`.
    pub source: &'static str,
    /// Upstream failure message, present only for fallback analyses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_error: Option<String>,
}

impl From<Analysis> for PlayerAnalysisResponse {
    fn from(analysis: Analysis) -> Self {
        let source = analysis.source();
        match analysis {
            Analysis::Analyzed { text } => Self {
                success: true,
                message: ANALYZED_MESSAGE,
                analysis: text,
                source,
                openai_error: None,
            },
            Analysis::Fallback { text, reason } => Self {
                success: true,
                message: FALLBACK_MESSAGE,
                analysis: text,
                source,
                openai_error: Some(reason),
            },
        }
    }
}

fn reject(error: ProfileError) -> Response {
    metrics::PLAYER_SUBMISSIONS_TOTAL
        .with_label_values(&["rejected"])
        .inc();
    tracing::info!("Rejected player submission: {error}");

    match &error {
        ProfileError::MissingFields => json_error(StatusCode::BAD_REQUEST, &error.to_string()),
        ProfileError::InvalidField { .. } => json_error_details(
            StatusCode::BAD_REQUEST,
            "Invalid player data",
            &error.to_string(),
        ),
        ProfileError::NotAnObject => {
            json_error_details(StatusCode::BAD_REQUEST, "Invalid JSON body", &error.to_string())
        }
    }
}

pub async fn submit_player(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            metrics::PLAYER_SUBMISSIONS_TOTAL
                .with_label_values(&["rejected"])
                .inc();
            return bad_json(rejection);
        }
    };

    let profile = match PlayerProfile::from_json(&body) {
        Ok(profile) => profile,
        Err(e) => return reject(e),
    };

    tracing::info!(
        "Received player data: age={} position={} weight={}kg height={}cm",
        profile.age,
        profile.position,
        profile.weight,
        profile.height
    );

    let analysis = analysis::analyze(state.provider.as_ref(), &profile).await;
    tracing::info!(
        "Analysis for {} ready: {} chars from {}",
        profile.position,
        analysis.text().len(),
        analysis.source()
    );
    if let Analysis::Fallback { reason, .. } = &analysis {
        tracing::warn!("Serving fallback analysis for {}: {reason}", profile.position);
    }

    (
        StatusCode::CREATED,
        Json(PlayerAnalysisResponse::from(analysis)),
    )
        .into_response()
}
