use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use log::warn;
use serde::{Deserialize, Serialize};

use super::{AppState, VisitorKey};
use crate::error::{Error, Result};
use crate::models::VoteCounts;
use crate::voting;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    #[serde(alias = "pairingId")]
    pub challenge_id: i64,
    #[serde(alias = "side")]
    pub choice: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    #[serde(flatten)]
    pub counts: VoteCounts,
    pub left_percentage: u32,
    pub right_percentage: u32,
}

impl From<VoteCounts> for Tally {
    fn from(counts: VoteCounts) -> Self {
        let (left_percentage, right_percentage) = counts.percentages();
        Self {
            counts,
            left_percentage,
            right_percentage,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
    #[serde(flatten)]
    pub tally: Tally,
}

/// POST /api/vote
pub async fn submit_vote(
    State(state): State<AppState>,
    VisitorKey(visitor_key): VisitorKey,
    payload: std::result::Result<Json<VotePayload>, JsonRejection>,
) -> Result<Json<VoteResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!("Rejected vote payload: {}", rejection.body_text());
        Error::InvalidArgument(rejection.body_text())
    })?;

    let counts = voting::cast_vote(
        &state.database,
        payload.challenge_id,
        &visitor_key,
        &payload.choice,
    )
    .await?;

    Ok(Json(VoteResponse {
        success: true,
        tally: counts.into(),
    }))
}

/// GET /api/results/:challenge_id
pub async fn results(
    State(state): State<AppState>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Tally>> {
    let pairing_id: i64 = challenge_id
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("malformed pairing id {:?}", challenge_id)))?;

    let counts = voting::get_vote_counts(&state.database, pairing_id).await?;
    Ok(Json(counts.into()))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{json_body, test_app};
    use super::super::FORWARDED_FOR;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn vote_request(visitor: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/vote")
            .header("content-type", "application/json")
            .header(FORWARDED_FOR, visitor)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn results_request(id: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/api/results/{id}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn vote_flow_over_http() {
        let (app, _db, _dir) = test_app(1).await;

        let res = app
            .clone()
            .oneshot(vote_request("1.2.3.4", json!({ "challengeId": 1, "choice": "left" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            json_body(res).await,
            json!({
                "success": true,
                "leftVotes": 1,
                "rightVotes": 0,
                "leftPercentage": 100,
                "rightPercentage": 0
            })
        );

        let res = app
            .clone()
            .oneshot(vote_request("5.6.7.8", json!({ "pairingId": 1, "side": "right" })))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert_eq!(body["leftVotes"], 1);
        assert_eq!(body["rightVotes"], 1);
        assert_eq!(body["leftPercentage"], 50);
        assert_eq!(body["rightPercentage"], 50);

        // Repeat from the first visitor leaves the tally alone.
        let res = app
            .clone()
            .oneshot(vote_request("1.2.3.4", json!({ "challengeId": 1, "choice": "right" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["leftVotes"], 1);
        assert_eq!(body["rightVotes"], 1);

        let res = app.oneshot(results_request("1")).await.unwrap();
        assert_eq!(
            json_body(res).await,
            json!({
                "leftVotes": 1,
                "rightVotes": 1,
                "leftPercentage": 50,
                "rightPercentage": 50
            })
        );
    }

    #[tokio::test]
    async fn bad_side_is_400() {
        let (app, _db, _dir) = test_app(1).await;
        let res = app
            .oneshot(vote_request("1.2.3.4", json!({ "challengeId": 1, "choice": "up" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_payload_is_400() {
        let (app, _db, _dir) = test_app(1).await;
        let res = app
            .oneshot(vote_request("1.2.3.4", json!({ "challengeId": "one", "choice": "left" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_pairing_is_404() {
        let (app, _db, _dir) = test_app(1).await;

        let res = app
            .clone()
            .oneshot(vote_request("1.2.3.4", json!({ "challengeId": 999999, "choice": "left" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app.oneshot(results_request("999999")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_results_id_is_400() {
        let (app, _db, _dir) = test_app(1).await;
        let res = app.oneshot(results_request("abc")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn results_for_unvoted_pairing_are_zero() {
        let (app, _db, _dir) = test_app(1).await;
        let res = app.oneshot(results_request("1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["leftVotes"], 0);
        assert_eq!(body["rightPercentage"], 0);
    }
}
