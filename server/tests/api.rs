use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use unfair_chess_server::ai::{AiError, AiMover, MoveProvider, MoveRequest, ProposedMove};
use unfair_chess_server::api::build_router;
use unfair_chess_server::build_state;
use unfair_chess_server::config::AiConfig;

async fn app_with(dir: &std::path::Path, ai: AiMover) -> axum::Router {
    let state = build_state(dir, Duration::from_secs(60), Arc::new(ai))
        .await
        .unwrap();
    build_router(state)
}

async fn app(dir: &std::path::Path) -> axum::Router {
    app_with(dir, AiMover::random_only().with_seed(42)).await
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Always proposes the same move with the same remark.
struct FixedProvider {
    from: &'static str,
    to: &'static str,
}

#[async_trait]
impl MoveProvider for FixedProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn propose(&self, _model: &str, _request: &MoveRequest) -> Result<ProposedMove, AiError> {
        Ok(ProposedMove {
            from: chess::parse_square(self.from).unwrap(),
            to: chess::parse_square(self.to).unwrap(),
            promotion: None,
            comment: "The rules bend for me.".into(),
        })
    }
}

#[tokio::test]
async fn health_and_bots() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(&app, "/bots").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn ai_game_opening_move() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let (status, game) = post_json(
        &app,
        "/games",
        json!({ "mode": "bot", "botId": "nexus-7", "playerColor": "white" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(game["phase"], "awaitingHumanMove");
    let id = game["id"].as_str().unwrap().to_string();

    let (status, game) = post_json(
        &app,
        &format!("/games/{id}/move"),
        json!({ "from": "e2", "to": "e4" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["moveHistory"].as_array().unwrap().len(), 2);
    assert_eq!(game["moveNotationHistory"][0], "e4");
    assert_eq!(game["sideToMove"], "white");
    assert_eq!(game["isOver"], false);
    assert_eq!(game["lastAiStrategy"], "random");

    let (status, fetched) = get_json(&app, &format!("/games/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["fen"], game["fen"]);
}

async fn paired_room(app: &axum::Router) -> String {
    post_json(
        app,
        "/matchmaking/join",
        json!({ "playerId": "p-ann", "displayName": "Ann", "timeControl": "rapid" }),
    )
    .await;
    let (_, matched) = post_json(
        app,
        "/matchmaking/join",
        json!({ "playerId": "p-bo", "displayName": "Bo", "timeControl": "rapid" }),
    )
    .await;
    matched["roomId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn out_of_turn_move_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let room = paired_room(&app).await;

    for (player, choice) in [("p-ann", "paper"), ("p-bo", "rock")] {
        let (status, _) = post_json(
            &app,
            &format!("/matches/{room}/rps"),
            json!({ "playerId": player, "choice": choice }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post_json(
        &app,
        &format!("/matches/{room}/move"),
        json!({ "playerId": "p-bo", "from": "e7", "to": "e5" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OUT_OF_TURN");

    let (_, snap) = get_json(&app, &format!("/matches/{room}")).await;
    assert!(snap["moveHistory"].as_array().unwrap().is_empty());
    assert_eq!(snap["sideToMove"], "white");
}

#[tokio::test]
async fn provider_fallback_and_resignation() {
    let dir = tempfile::tempdir().unwrap();
    let provider: Arc<dyn MoveProvider> = Arc::new(FixedProvider {
        from: "d1",
        to: "e8",
    });
    let app = app_with(
        dir.path(),
        AiMover::new(Some(provider), &AiConfig::default()).with_seed(1),
    )
    .await;

    let (_, game) = post_json(
        &app,
        "/games",
        json!({ "mode": "bot", "botId": "vortex", "playerColor": "black" }),
    )
    .await;
    let id = game["id"].as_str().unwrap().to_string();
    // the provider only ever goes for the black king, so the AI falls back
    assert_eq!(game["sideToMove"], "black");
    assert_eq!(game["lastAiStrategy"], "random");

    let (_, game) = post_json(
        &app,
        &format!("/games/{id}/move"),
        json!({ "from": "e7", "to": "e5" }),
    )
    .await;
    let before = game["moveHistory"].as_array().unwrap().len();
    assert_eq!(game["sideToMove"], "black");

    let (status, body) = post_json(&app, &format!("/games/{id}/resign"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winner"], "white");

    let (status, body) = post_json(
        &app,
        &format!("/games/{id}/move"),
        json!({ "from": "d7", "to": "d5" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "GAME_ALREADY_OVER");

    let (_, after) = get_json(&app, &format!("/games/{id}")).await;
    assert_eq!(after["moveHistory"].as_array().unwrap().len(), before);
}

#[tokio::test]
async fn ai_may_force_an_illegal_move() {
    let dir = tempfile::tempdir().unwrap();
    let provider: Arc<dyn MoveProvider> = Arc::new(FixedProvider {
        from: "d8",
        to: "h4",
    });
    let app = app_with(
        dir.path(),
        AiMover::new(Some(provider), &AiConfig::default()),
    )
    .await;

    let (_, game) = post_json(
        &app,
        "/games",
        json!({ "mode": "bot", "botId": "phantom", "playerColor": "white" }),
    )
    .await;
    let id = game["id"].as_str().unwrap().to_string();

    let (status, game) = post_json(
        &app,
        &format!("/games/{id}/move"),
        json!({ "from": "e2", "to": "e4" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["moveNotationHistory"][1], "d8-h4*");
    assert_eq!(game["moveHistory"][1]["forced"], true);
    assert_eq!(game["lastAiStrategy"], "primary");
    assert_eq!(game["lastComment"], "The rules bend for me.");
}

#[tokio::test]
async fn unknown_game_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let (status, body) = get_json(&app, "/games/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_body_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;
    let (_, game) = post_json(&app, "/games", json!({ "mode": "bot" })).await;
    let id = game["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        &format!("/games/{id}/move"),
        json!({ "from": "e2", "to": "x9" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_REQUEST");

    let (status, _) = post_json(&app, &format!("/games/{id}/move"), json!({ "to": "e4" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn matchmaking_to_chaos_duel() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let (status, first) = post_json(
        &app,
        "/matchmaking/join",
        json!({ "playerId": "p-ann", "displayName": "Ann", "timeControl": "blitz" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "waiting");

    let (_, second) = post_json(
        &app,
        "/matchmaking/join",
        json!({ "playerId": "p-bo", "displayName": "Bo" }),
    )
    .await;
    assert_eq!(second["status"], "matched");
    let room = second["roomId"].as_str().unwrap().to_string();

    let (_, rejoin) = post_json(
        &app,
        "/matchmaking/join",
        json!({ "playerId": "p-ann", "displayName": "Ann" }),
    )
    .await;
    assert_eq!(rejoin["roomId"], room.as_str());

    let (_, status_body) = get_json(&app, "/matchmaking/status/p-ann").await;
    assert_eq!(status_body["status"], "matched");
    assert_eq!(status_body["match"]["white"]["playerId"], "p-ann");

    let (_, snap) = post_json(
        &app,
        &format!("/matches/{room}/rps"),
        json!({ "playerId": "p-bo", "choice": "scissors" }),
    )
    .await;
    assert_eq!(snap["phase"], "rockPaperScissors");
    assert_eq!(snap["black"]["rpsSubmitted"], true);

    let (_, snap) = post_json(
        &app,
        &format!("/matches/{room}/rps"),
        json!({ "playerId": "p-ann", "choice": "rock" }),
    )
    .await;
    assert_eq!(snap["phase"], "playing");
    assert_eq!(snap["chaosTokenHolder"], "white");

    let (status, body) = post_json(
        &app,
        &format!("/matches/{room}/move"),
        json!({ "playerId": "p-bo", "from": "e7", "to": "e5" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OUT_OF_TURN");

    let (status, body) = post_json(
        &app,
        &format!("/matches/{room}/move"),
        json!({ "playerId": "p-eve", "from": "e2", "to": "e4" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NOT_PARTICIPANT");

    let (status, snap) = post_json(
        &app,
        &format!("/matches/{room}/move"),
        json!({ "playerId": "p-ann", "from": "d1", "to": "d7", "useChaosToken": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["moveNotationHistory"][0], "d1-d7*");
    assert_eq!(snap["chaosTokenUsed"], true);

    let (_, snap) = post_json(
        &app,
        &format!("/matches/{room}/chat"),
        json!({ "playerId": "p-bo", "message": "  that was rude  " }),
    )
    .await;
    assert_eq!(snap["chatLog"][0]["text"], "that was rude");

    let (_, snap) = post_json(
        &app,
        &format!("/matches/{room}/draw"),
        json!({ "playerId": "p-bo", "action": "offer" }),
    )
    .await;
    assert_eq!(snap["drawOfferedBy"], "p-bo");

    let (_, snap) = post_json(
        &app,
        &format!("/matches/{room}/draw"),
        json!({ "playerId": "p-ann", "action": "accept" }),
    )
    .await;
    assert_eq!(snap["isOver"], true);
    assert_eq!(snap["outcome"], "draw");
    assert_eq!(snap["drawReason"], "agreement");

    let (_, status_body) = get_json(&app, "/matchmaking/status/p-ann").await;
    assert_eq!(status_body["status"], "idle");

    let (_, left) = post_json(&app, "/matchmaking/leave", json!({ "playerId": "p-ann" })).await;
    assert_eq!(left["status"], "left");
}
