mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use common::{setup_state, FakeTelegram, GLOBAL_CHAT_ID};
use hackabot::database::models::*;
use hackabot::services::api::{NodeDetailResponse, NodesResponse, PhotosResponse};
use hackabot::services::attendance::attending_window;
use hackabot::services::health::HealthResponse;
use hackabot::services::{router, AppState};

async fn person(state: &AppState<FakeTelegram>, telegram_id: i64, first_name: &str) -> Result<Person> {
    let profile = TelegramProfile {
        telegram_id,
        first_name: first_name.to_string(),
        ..Default::default()
    };
    let mut person = Person::upsert(&state.db.pool, &profile).await?;
    person.set_privacy(&state.db.pool, false).await?;
    Ok(person)
}

async fn node_with_group(state: &AppState<FakeTelegram>, chat_id: i64, name: &str) -> Result<(Group, Node)> {
    let group = Group::upsert(&state.db.pool, chat_id, name).await?;
    let node = Node::create(
        &state.db.pool,
        &NewNode {
            group_id: Some(group.id),
            emoji: "🦀".to_string(),
            signup_url: "https://example.com/join".to_string(),
            location: "Brighton, UK".to_string(),
            timezone: "Europe/London".to_string(),
            established: Some(2023),
            ..NewNode::named(name)
        },
    )
    .await?;
    Ok((group, node))
}

#[tokio::test]
async fn test_nodes_empty() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let server = TestServer::new(router(state))?;

    let response = server.get("/api/nodes/").await;
    response.assert_status_ok();
    assert_eq!(response.header("access-control-allow-origin"), "*");

    let body: NodesResponse = response.json();
    assert!(body.nodes.is_empty());
    assert!(body.people.is_empty());
    assert_eq!(body.stats.people_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_preflight_has_cors_headers() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let server = TestServer::new(router(state))?;

    for path in ["/api/nodes/", "/api/nodes/hackabrighton/", "/api/photos/"] {
        let response = server.method(Method::OPTIONS, path).await;
        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
        assert_eq!(response.header("access-control-allow-methods"), "GET, OPTIONS");
        assert_eq!(response.header("access-control-allow-headers"), "Content-Type");
    }
    Ok(())
}

#[tokio::test]
async fn test_nodes_lists_public_people() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let pool = &state.db.pool;
    let (group, node) = node_with_group(&state, -100111, "Hackabrighton").await?;
    let now = Utc::now();

    // Alice said yes this week.
    let alice = person(&state, 1, "alice").await?;
    GroupPerson::set_left(pool, group.id, alice.id, false).await?;
    let poll = Poll::create(pool, "poll-1", Some(node.id), "Who's coming?", now).await?;
    PollAnswer::upsert(pool, poll.id, alice.id, true).await?;

    // Bob only chatted.
    let mut bob = person(&state, 2, "Bob").await?;
    bob.set_username_x(pool, "bob_x").await?;
    GroupPerson::touch(pool, group.id, bob.id, now).await?;

    // Carol chatted but is private.
    let mut carol = person(&state, 3, "Carol").await?;
    carol.set_privacy(pool, true).await?;
    GroupPerson::touch(pool, group.id, carol.id, now).await?;

    // Dave is only in the global chat.
    let global = Group::upsert(pool, GLOBAL_CHAT_ID, "Hacka* Global").await?;
    let dave = person(&state, 4, "Dave").await?;
    GroupPerson::set_left(pool, global.id, dave.id, false).await?;

    let server = TestServer::new(router(state.clone()))?;
    let body: NodesResponse = server.get("/api/nodes/").await.json();

    let attending = attending_window(Utc::now()).is_some();
    assert_eq!(body.nodes.len(), 1);
    let node_data = &body.nodes[0];
    assert_eq!(node_data.id, "hackabrighton");
    assert_eq!(node_data.emoji, "🦀");
    assert_eq!(node_data.url, "https://example.com/join");
    assert_eq!(node_data.established, Some(2023));
    assert_eq!(node_data.attending_count, if attending { 1 } else { 0 });

    let names: Vec<&str> = body.people.iter().map(|p| p.display_name.as_str()).collect();
    assert_eq!(names, vec!["alice", "Bob"]);

    let alice_data = &body.people[0];
    assert_eq!(alice_data.nodes.len(), 1);
    assert_eq!(alice_data.nodes[0].id, "hackabrighton");
    assert_eq!(alice_data.nodes[0].attending, attending);
    assert_eq!(alice_data.username_x, None);

    let bob_data = &body.people[1];
    assert_eq!(bob_data.username_x.as_deref(), Some("bob_x"));
    assert!(!bob_data.nodes[0].attending);

    assert_eq!(body.stats.people_count, 4);
    Ok(())
}

#[tokio::test]
async fn test_people_fields_are_html_escaped() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let pool = &state.db.pool;
    let (group, _) = node_with_group(&state, -100111, "Hackabrighton").await?;

    let mut eve = person(&state, 5, "<b>Eve</b>").await?;
    eve.set_bio(pool, "Tea & \"robots\"").await?;
    GroupPerson::touch(pool, group.id, eve.id, Utc::now()).await?;

    let server = TestServer::new(router(state.clone()))?;
    let body: NodesResponse = server.get("/api/nodes/").await.json();

    assert_eq!(body.people[0].display_name, "&lt;b&gt;Eve&lt;/b&gt;");
    assert_eq!(body.people[0].bio.as_deref(), Some("Tea &amp; &quot;robots&quot;"));
    Ok(())
}

#[tokio::test]
async fn test_node_detail() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let pool = &state.db.pool;
    let (group, node) = node_with_group(&state, -100111, "Hackabrighton").await?;
    let (_, other) = node_with_group(&state, -100222, "Hackalondon").await?;

    let alice = person(&state, 1, "Alice").await?;
    GroupPerson::touch(pool, group.id, alice.id, Utc::now()).await?;
    Photo::create(pool, node.id, "file-a", &[1, 2, 3], None, Utc::now()).await?;
    Photo::create(pool, other.id, "file-b", &[4, 5, 6], None, Utc::now()).await?;

    let server = TestServer::new(router(state.clone()))?;
    let response = server.get("/api/nodes/hackabrighton/").await;
    response.assert_status_ok();

    let body: NodeDetailResponse = response.json();
    assert_eq!(body.node.name, "Hackabrighton");
    assert_eq!(body.people.len(), 1);
    assert_eq!(body.people[0].display_name, "Alice");
    assert_eq!(body.stats.people_count, 1);
    assert_eq!(body.photos.len(), 1);
    assert_eq!(body.photos[0].node_name, "Hackabrighton");
    Ok(())
}

#[tokio::test]
async fn test_node_detail_not_found() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    Node::create(
        &state.db.pool,
        &NewNode {
            disabled: true,
            ..NewNode::named("Hackaparis")
        },
    )
    .await?;
    let server = TestServer::new(router(state))?;

    assert_eq!(server.get("/api/nodes/nowhere/").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(server.get("/api/nodes/hackaparis/").await.status_code(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_recent_photos_newest_first_and_limited() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let pool = &state.db.pool;
    let (_, node) = node_with_group(&state, -100111, "Hackabrighton").await?;
    let now = Utc::now();

    for i in 0..15 {
        Photo::create(pool, node.id, &format!("file-{i}"), &[0], None, now - Duration::hours(i)).await?;
    }
    Photo::create(pool, node.id, "old", &[0], None, now - Duration::days(20)).await?;

    let server = TestServer::new(router(state.clone()))?;
    let body: PhotosResponse = server.get("/api/photos/").await.json();

    assert_eq!(body.photos.len(), 12);
    let newest = Photo::find_by_file_id(pool, "file-0").await?.unwrap();
    assert_eq!(body.photos[0].id, newest.id);
    assert_eq!(body.photos[0].node_emoji, "🦀");
    Ok(())
}

#[tokio::test]
async fn test_photo_image() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let (_, node) = node_with_group(&state, -100111, "Hackabrighton").await?;
    let photo = Photo::create(&state.db.pool, node.id, "file-a", &[0xFF, 0xD8, 0xFF], None, Utc::now()).await?;
    let server = TestServer::new(router(state.clone()))?;

    let response = server.get(&format!("/api/photos/{}/image", photo.id)).await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/jpeg");
    assert_eq!(response.header("cache-control"), "public, max-age=86400");
    assert_eq!(response.as_bytes().to_vec(), vec![0xFF, 0xD8, 0xFF]);

    let missing = server.get("/api/photos/9999/image").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    for bad_id in ["abc", "-1", "+1", "1.5", "99999999999999999999"] {
        let response = server.get(&format!("/api/photos/{bad_id}/image")).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "id {bad_id}");
    }
    Ok(())
}

#[tokio::test]
async fn test_health_endpoints() -> Result<()> {
    let (state, _temp_dir) = setup_state(FakeTelegram::new()).await?;
    let server = TestServer::new(router(state))?;

    let response = server.get("/health").await;
    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.environment, "dev");
    assert_eq!(health.database.status, "healthy");

    assert_eq!(server.get("/health/ready").await.json::<String>(), "ready");
    assert_eq!(server.get("/health/live").await.json::<String>(), "alive");
    Ok(())
}
