//! Full encounter scenario
//!
//! The dungeon master builds a roster live, a player joins the fight, and
//! the session listing tracks the outcome.

use serde_json::{json, Value};

use crate::harness::TestServer;

fn names(doc: &Value) -> Vec<String> {
    doc["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect()
}

fn id_of(doc: &Value, name: &str) -> String {
    doc["entities"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == name)
        .and_then(|e| e["id"].as_str())
        .unwrap()
        .to_string()
}

/// Test: Roster setup, edits, a kill and the listing label
#[tokio::test]
async fn test_goblin_ambush() {
    let server = TestServer::start().await.expect("Failed to start server");
    let id = server.create_session("dm").await.unwrap();
    server
        .command("dm", &id, json!({"type": "add_player", "player": "pat"}))
        .await
        .unwrap();

    let mut dm = server.join(&id, "dm").await.unwrap();
    let mut pat = server.join(&id, "pat").await.unwrap();

    for (name, health, initiative) in [("Hero", 45, 18), ("Goblin", 12, 14), ("Archer", 20, 14)] {
        dm.command(json!({
            "type": "add_entity",
            "entity": {"name": name, "health": health, "maxHealth": health, "initiative": initiative}
        }))
        .await
        .unwrap();
        dm.expect_session().await.unwrap();
    }
    let doc = pat.drain().await.pop().unwrap()["session"].clone();
    assert_eq!(names(&doc), ["Hero", "Goblin", "Archer"]);

    // Defaults fill in whatever the draft leaves out
    dm.command(json!({"type": "add_entity", "entity": {"name": "Rat"}}))
        .await
        .unwrap();
    let doc = dm.expect_session().await.unwrap();
    let rat = doc["entities"][3].clone();
    assert_eq!(rat["health"], 10);
    assert_eq!(rat["maxHealth"], 10);
    assert_eq!(rat["initiative"], 10);
    assert_eq!(rat["statuses"], json!([]));

    // The goblin rolls again and gets renamed
    let goblin = id_of(&doc, "Goblin");
    dm.command(json!({
        "type": "update_entity",
        "id": goblin,
        "patch": {"name": "Goblin Boss", "initiative": 22}
    }))
    .await
    .unwrap();
    let doc = dm.expect_session().await.unwrap();
    assert_eq!(names(&doc), ["Hero", "Goblin Boss", "Archer", "Rat"]);
    assert_eq!(doc["entities"][1]["initiative"], 22);
    assert_eq!(doc["entities"][1]["health"], 12);

    // Unknown statuses in a patch are rejected whole
    dm.command(json!({
        "type": "update_entity",
        "id": goblin,
        "patch": {"name": "Renamed", "statuses": ["Sleepy"]}
    }))
    .await
    .unwrap();
    dm.expect("error").await.unwrap();

    // Pat kills the rat and the boss
    let rat = id_of(&doc, "Rat");
    pat.drain().await;
    pat.command(json!({"type": "damage", "id": rat, "amount": 100}))
        .await
        .unwrap();
    pat.command(json!({"type": "damage", "id": goblin, "amount": 12}))
        .await
        .unwrap();
    pat.expect_session().await.unwrap();
    let doc = pat.expect_session().await.unwrap();
    assert_eq!(doc["entities"][1]["health"], 0);
    assert_eq!(doc["entities"][3]["health"], 0);

    // Dead combatants keep their place in the roster
    assert_eq!(doc["entities"].as_array().unwrap().len(), 4);

    let resp = server.get_as("pat", "/sessions").await.unwrap();
    let list: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(list[0]["label"], "Hero, Goblin Boss, Archer +1 more");
    assert_eq!(list[0]["entityCount"], 4);
    assert_eq!(list[0]["aliveCount"], 2);
    assert_eq!(list[0]["playerCount"], 1);

    // Finish the fight
    dm.drain().await;
    for name in ["Hero", "Archer"] {
        dm.command(json!({"type": "damage", "id": id_of(&doc, name), "amount": 999}))
            .await
            .unwrap();
        dm.expect_session().await.unwrap();
    }

    let resp = server.get_as("dm", "/sessions").await.unwrap();
    let list: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(list[0]["label"], "Combat (All Dead)");
    assert_eq!(list[0]["aliveCount"], 0);
}

/// Test: Deleting the actor leaves the index where it was
#[tokio::test]
async fn test_delete_keeps_turn_position() {
    let server = TestServer::start().await.expect("Failed to start server");
    let id = server.create_session("dm").await.unwrap();
    server.add_entity("dm", &id, "Drago", 120, 120, 20).await.unwrap();
    let hero = server.add_entity("dm", &id, "Hero", 45, 50, 18).await.unwrap();
    server.add_entity("dm", &id, "Goblin", 12, 15, 14).await.unwrap();

    let doc = server
        .command("dm", &id, json!({"type": "advance_turn"}))
        .await
        .unwrap();
    assert_eq!(doc["currentTurnIndex"], 1);

    // Hero was acting; Goblin slides into position 1
    let doc = server
        .command("dm", &id, json!({"type": "delete_entity", "id": hero}))
        .await
        .unwrap();
    assert_eq!(doc["currentTurnIndex"], 1);
    assert_eq!(names(&doc), ["Drago", "Goblin"]);

    // Wrap uses the current roster size
    let doc = server
        .command("dm", &id, json!({"type": "advance_turn"}))
        .await
        .unwrap();
    assert_eq!(doc["currentTurnIndex"], 0);
    assert_eq!(doc["currentRound"], 2);
}
