//! Public read-only JSON API used by hacka.network.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::database::models::{Group, GroupPerson, Node, Person, Photo, PhotoSummary, PollAnswer};
use crate::services::attendance::{attending_count, attending_person_ids};
use crate::services::telegram::TelegramApi;
use crate::services::AppState;
use crate::utils::text::html_escape;

pub const PHOTO_LIMIT: i64 = 12;
pub const PHOTO_MAX_AGE_DAYS: i64 = 14;
const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub url: String,
    pub established: Option<i64>,
    pub location: String,
    pub timezone: String,
    pub disabled: bool,
    pub attending_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonNode {
    pub id: String,
    pub attending: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonData {
    pub display_name: String,
    pub username_x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub nodes: Vec<PersonNode>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Stats {
    pub people_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoData {
    pub id: i64,
    pub node_name: String,
    pub node_emoji: String,
    pub created: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeData>,
    pub people: Vec<PersonData>,
    pub stats: Stats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDetailResponse {
    pub node: NodeData,
    pub people: Vec<PersonData>,
    pub stats: Stats,
    pub photos: Vec<PhotoData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotosResponse {
    pub photos: Vec<PhotoData>,
}

/// API routes, all answering CORS headers and `OPTIONS`.
pub fn routes<T: TelegramApi>() -> Router<AppState<T>> {
    let cors = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ));

    Router::new()
        .route("/api/nodes/", get(api_nodes::<T>).options(preflight))
        .route("/api/nodes/:node_slug/", get(api_node_detail::<T>).options(preflight))
        .route("/api/photos/", get(api_recent_photos::<T>).options(preflight))
        .route(
            "/api/photos/:photo_id/image",
            get(api_photo_image::<T>).options(preflight),
        )
        .layer(cors)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn internal_error(context: &str, err: sqlx::Error) -> StatusCode {
    tracing::error!("API error in {}: {}", context, err);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn node_data(
    pool: &sqlx::SqlitePool,
    node: &Node,
    now: DateTime<Utc>,
) -> Result<NodeData, sqlx::Error> {
    Ok(NodeData {
        id: node.name_slug(),
        name: node.name.clone(),
        emoji: node.emoji.clone(),
        url: node.signup_url.clone(),
        established: node.established,
        location: node.location.clone(),
        timezone: node.timezone.clone(),
        disabled: node.disabled,
        attending_count: attending_count(pool, node, now).await?,
    })
}

fn person_data(person: &Person, nodes: Vec<PersonNode>) -> PersonData {
    PersonData {
        display_name: html_escape(&person.first_name),
        username_x: (!person.username_x.is_empty()).then(|| html_escape(&person.username_x)),
        bio: (!person.bio.is_empty()).then(|| html_escape(&person.bio)),
        nodes,
    }
}

/// Attending people first, then by name.
fn sort_people(mut people: Vec<(bool, String, PersonData)>) -> Vec<PersonData> {
    people.sort_by(|a, b| (!a.0, &a.1).cmp(&(!b.0, &b.1)));
    people.into_iter().map(|(_, _, data)| data).collect()
}

fn photo_data(photo: PhotoSummary) -> PhotoData {
    PhotoData {
        id: photo.id,
        node_name: photo.node_name,
        node_emoji: photo.node_emoji,
        created: photo.created.to_rfc3339(),
    }
}

async fn recent_photos(
    pool: &sqlx::SqlitePool,
    node_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Vec<PhotoData>, sqlx::Error> {
    let since = now - Duration::days(PHOTO_MAX_AGE_DAYS);
    let photos = Photo::recent(pool, node_id, since, PHOTO_LIMIT).await?;
    Ok(photos.into_iter().map(photo_data).collect())
}

async fn api_nodes<T: TelegramApi>(
    State(state): State<AppState<T>>,
) -> Result<Json<NodesResponse>, StatusCode> {
    build_nodes_response(&state)
        .await
        .map(Json)
        .map_err(|e| internal_error("nodes", e))
}

async fn build_nodes_response<T: TelegramApi>(state: &AppState<T>) -> Result<NodesResponse, sqlx::Error> {
    let pool = &state.db.pool;
    let now = Utc::now();
    let nodes = Node::find_all(pool).await?;

    let mut nodes_data = Vec::with_capacity(nodes.len());
    let mut attending_by_node: HashMap<i64, HashSet<i64>> = HashMap::new();
    for node in &nodes {
        nodes_data.push(node_data(pool, node, now).await?);
        attending_by_node.insert(node.id, attending_person_ids(pool, node, now).await?);
    }

    // Nodes each person ever said yes for, in answer order.
    let mut attended: HashMap<i64, Vec<i64>> = HashMap::new();
    for (person_id, node_id) in PollAnswer::yes_node_pairs(pool).await? {
        let node_ids = attended.entry(person_id).or_default();
        if !node_ids.contains(&node_id) {
            node_ids.push(node_id);
        }
    }

    // Fallback: the node group the person chatted in most recently.
    let mut node_by_group: HashMap<i64, i64> = HashMap::new();
    for node in &nodes {
        if let Some(group_id) = node.group_id {
            node_by_group.insert(group_id, node.id);
        }
    }
    let group_ids: Vec<i64> = node_by_group.keys().copied().collect();
    let mut last_chatted: HashMap<i64, i64> = HashMap::new();
    for membership in GroupPerson::recent_chatters(pool, &group_ids).await? {
        if let Some(&node_id) = node_by_group.get(&membership.group_id) {
            last_chatted.entry(membership.person_id).or_insert(node_id);
        }
    }

    let node_lookup: HashMap<i64, &Node> = nodes.iter().map(|node| (node.id, node)).collect();
    let candidates: Vec<i64> = attended
        .keys()
        .chain(last_chatted.keys())
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut people = Vec::new();
    for person in Person::find_public_by_ids(pool, &candidates).await? {
        let mut person_nodes = Vec::new();

        match attended.get(&person.id) {
            Some(node_ids) => {
                for node_id in node_ids {
                    let Some(node) = node_lookup.get(node_id) else {
                        continue;
                    };
                    let attending = attending_by_node
                        .get(node_id)
                        .is_some_and(|ids| ids.contains(&person.id));
                    person_nodes.push(PersonNode {
                        id: node.name_slug(),
                        attending,
                    });
                }
            }
            None => {
                if let Some(node) = last_chatted.get(&person.id).and_then(|id| node_lookup.get(id)) {
                    person_nodes.push(PersonNode {
                        id: node.name_slug(),
                        attending: false,
                    });
                }
            }
        }

        if person_nodes.is_empty() {
            continue;
        }

        person_nodes.sort_by_key(|node| !node.attending);
        let attending_any = person_nodes.iter().any(|node| node.attending);
        people.push((attending_any, person.first_name.to_lowercase(), person_data(&person, person_nodes)));
    }

    let mut counted_groups: Vec<i64> = nodes.iter().filter_map(|node| node.group_id).collect();
    if let Some(global_chat_id) = state.config.global_chat_id {
        if let Some(global) = Group::find_by_telegram_id(pool, global_chat_id).await? {
            counted_groups.push(global.id);
        }
    }
    let people_count = GroupPerson::count_active_people(pool, &counted_groups).await?;

    Ok(NodesResponse {
        nodes: nodes_data,
        people: sort_people(people),
        stats: Stats { people_count },
    })
}

async fn api_node_detail<T: TelegramApi>(
    State(state): State<AppState<T>>,
    Path(node_slug): Path<String>,
) -> Result<Json<NodeDetailResponse>, StatusCode> {
    let pool = &state.db.pool;
    let node = Node::find_by_name_slug(pool, &node_slug)
        .await
        .map_err(|e| internal_error("node detail", e))?
        .ok_or(StatusCode::NOT_FOUND)?;

    build_node_detail(pool, &node)
        .await
        .map(Json)
        .map_err(|e| internal_error("node detail", e))
}

async fn build_node_detail(pool: &sqlx::SqlitePool, node: &Node) -> Result<NodeDetailResponse, sqlx::Error> {
    let now = Utc::now();
    let slug = node.name_slug();
    let attending_ids = attending_person_ids(pool, node, now).await?;

    let mut candidates: HashSet<i64> = PollAnswer::yes_node_pairs(pool)
        .await?
        .into_iter()
        .filter(|(_, node_id)| *node_id == node.id)
        .map(|(person_id, _)| person_id)
        .collect();
    if let Some(group_id) = node.group_id {
        for membership in GroupPerson::recent_chatters(pool, &[group_id]).await? {
            candidates.insert(membership.person_id);
        }
    }
    let candidates: Vec<i64> = candidates.into_iter().collect();

    let mut people = Vec::new();
    for person in Person::find_public_by_ids(pool, &candidates).await? {
        let attending = attending_ids.contains(&person.id);
        let nodes = vec![PersonNode {
            id: slug.clone(),
            attending,
        }];
        people.push((attending, person.first_name.to_lowercase(), person_data(&person, nodes)));
    }

    let counted_groups: Vec<i64> = node.group_id.into_iter().collect();
    let people_count = GroupPerson::count_active_people(pool, &counted_groups).await?;

    Ok(NodeDetailResponse {
        node: node_data(pool, node, now).await?,
        people: sort_people(people),
        stats: Stats { people_count },
        photos: recent_photos(pool, Some(node.id), now).await?,
    })
}

async fn api_recent_photos<T: TelegramApi>(
    State(state): State<AppState<T>>,
) -> Result<Json<PhotosResponse>, StatusCode> {
    let photos = recent_photos(&state.db.pool, None, Utc::now())
        .await
        .map_err(|e| internal_error("photos", e))?;
    Ok(Json(PhotosResponse { photos }))
}

async fn api_photo_image<T: TelegramApi>(
    State(state): State<AppState<T>>,
    Path(photo_id): Path<String>,
) -> Result<Response, StatusCode> {
    // Only plain digits name a photo; anything else is simply not found.
    let photo_id = Some(photo_id.as_str())
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|id| id.parse::<i64>().ok())
        .ok_or(StatusCode::NOT_FOUND)?;

    let photo = Photo::find_by_id(&state.db.pool, photo_id)
        .await
        .map_err(|e| internal_error("photo image", e))?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL),
        ],
        photo.image_data,
    )
        .into_response())
}
