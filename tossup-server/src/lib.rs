use serde::Deserialize;
use std::sync::Arc;
use warp::Filter;

use crate::registry::{RoomRegistry, is_valid_room_id};
use crate::websocket::{ConnectionLimits, ConnectionManager};

#[derive(Deserialize)]
struct JoinQuery {
    name: Option<String>,
}

pub mod config;
pub mod narration;
pub mod registry;
pub mod room_task;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
    limits: ConnectionLimits,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Clone for filters
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    let limits_filter = warp::any().map(move || limits.clone());

    // WebSocket endpoint, one room per path segment
    let websocket = warp::path!("ws" / String)
        .and(warp::query::<JoinQuery>())
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(registry_filter.clone())
        .and(limits_filter)
        .map(
            |room_id: String,
             query: JoinQuery,
             ws: warp::ws::Ws,
             conn_mgr,
             registry,
             limits|
             -> Box<dyn warp::Reply> {
                if !is_valid_room_id(&room_id) {
                    return Box::new(warp::reply::with_status(
                        warp::reply::json(&serde_json::json!({
                            "error": "Invalid room id"
                        })),
                        warp::http::StatusCode::BAD_REQUEST,
                    ));
                }

                let name = query.name.unwrap_or_default();
                Box::new(ws.on_upgrade(move |socket| {
                    websocket::handle_connection(socket, room_id, name, conn_mgr, registry, limits)
                }))
            },
        );

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Room state endpoint - never includes the hidden answer
    let room_state = warp::path!("rooms" / String)
        .and(warp::get())
        .and(registry_filter.clone())
        .and_then(handle_room_state_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(room_state)
        .with(cors)
        .with(warp::log("tossup"))
}

async fn handle_room_state_request(
    room_id: String,
    registry: Arc<RoomRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !is_valid_room_id(&room_id) {
        return Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Invalid room id"
            })),
            warp::http::StatusCode::BAD_REQUEST,
        ));
    }

    let snapshot = match registry.get(&room_id) {
        Some(room) => room.snapshot().await.ok(),
        None => None,
    };

    match snapshot {
        Some(snapshot) => Ok(warp::reply::with_status(
            warp::reply::json(&snapshot),
            warp::http::StatusCode::OK,
        )),
        None => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            warp::http::StatusCode::NOT_FOUND,
        )),
    }
}
