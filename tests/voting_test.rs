//! Vote ledger scenarios: upsert semantics and public tallies

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::{json, Value};
use uuid::Uuid;

fn tally_for<'a>(tallies: &'a Value, target: &str, value: &Value) -> Option<&'a Value> {
    tallies
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["targetId"] == target && &entry["value"] == value)
        .map(|entry| &entry["count"])
}

#[tokio::test]
async fn test_recast_replaces_previous_vote() {
    let ctx = TestContext::new();
    let organizer = organizer();
    let voter = student();
    let event_id = ctx.create_event(&organizer, event_body(json!([voting_module(&["best-talk"])]))).await;
    let uri = format!("/votes/{}", event_id);

    let (status, first) = ctx.post(&uri, Some(&voter), json!({ "targetId": "best-talk", "value": "rust" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = ctx.post(&uri, Some(&voter), json!({ "targetId": "best-talk", "value": "go" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["value"], "go");

    let (status, tallies) = ctx.get(&format!("/votes/event/{}", event_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tallies.as_array().unwrap().len(), 1);
    assert_eq!(tally_for(&tallies, "best-talk", &json!("go")), Some(&json!(1)));
    assert_eq!(tally_for(&tallies, "best-talk", &json!("rust")), None);
}

#[tokio::test]
async fn test_tally_counts_distinct_voters() {
    let ctx = TestContext::new();
    let organizer = organizer();
    let event_id = ctx
        .create_event(&organizer, event_body(json!([voting_module(&["mvp", "rating"])])))
        .await;
    let uri = format!("/votes/{}", event_id);

    let voters = [student(), student(), student()];
    for voter in &voters {
        ctx.post(&uri, Some(voter), json!({ "targetId": "rating", "value": 5 })).await;
    }
    ctx.post(&uri, Some(&voters[0]), json!({ "targetId": "mvp", "value": true })).await;
    ctx.post(&uri, Some(&voters[1]), json!({ "targetId": "mvp", "value": true })).await;
    ctx.post(&uri, Some(&voters[1]), json!({ "targetId": "mvp", "value": true })).await;

    let (_, tallies) = ctx.get(&format!("/votes/event/{}", event_id), None).await;
    assert_eq!(tally_for(&tallies, "rating", &json!(5)), Some(&json!(3)));
    assert_eq!(tally_for(&tallies, "mvp", &json!(true)), Some(&json!(2)));

    let total: i64 = tallies.as_array().unwrap().iter().map(|entry| entry["count"].as_i64().unwrap()).sum();
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_vote_preconditions() {
    let ctx = TestContext::new();
    let organizer = organizer();
    let voter = student();

    let registration_only = ctx.create_event(&organizer, event_body(json!([registration_module(None)]))).await;
    let (status, error) = ctx
        .post(&format!("/votes/{}", registration_only), Some(&voter), json!({ "targetId": "x", "value": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MODULE_NOT_ENABLED");

    let (status, _) = ctx
        .post(&format!("/votes/{}", Uuid::new_v4()), Some(&voter), json!({ "targetId": "x", "value": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let event_id = ctx.create_event(&organizer, event_body(json!([voting_module(&["mvp"])]))).await;
    let uri = format!("/votes/{}", event_id);

    let (status, _) = ctx.post(&uri, None, json!({ "targetId": "mvp", "value": 1 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let rejected = [
        json!({ "targetId": "unknown-poll", "value": 1 }),
        json!({ "value": 1 }),
        json!({ "targetId": "mvp" }),
        json!({ "targetId": "mvp", "value": { "nested": true } }),
    ];
    for body in rejected {
        let (status, error) = ctx.post(&uri, Some(&voter), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
        assert_eq!(error["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_my_votes_and_public_tally() {
    let ctx = TestContext::new();
    let organizer = organizer();
    let voter = student();
    let event_id = ctx
        .create_event(&organizer, event_body(json!([voting_module(&["mvp", "rating"])])))
        .await;
    let uri = format!("/votes/{}", event_id);

    ctx.post(&uri, Some(&voter), json!({ "targetId": "rating", "value": 4 })).await;
    ctx.post(&uri, Some(&voter), json!({ "targetId": "mvp", "value": "ada" })).await;
    ctx.post(&uri, Some(&student()), json!({ "targetId": "mvp", "value": "grace" })).await;

    let (status, mine) = ctx.get(&format!("/votes/my/{}", event_id), Some(&voter)).await;
    assert_eq!(status, StatusCode::OK);
    let targets: Vec<&str> = mine.as_array().unwrap().iter().map(|v| v["targetId"].as_str().unwrap()).collect();
    assert_eq!(targets, vec!["mvp", "rating"]);

    let (status, _) = ctx.get(&format!("/votes/my/{}", event_id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get(&format!("/votes/event/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
