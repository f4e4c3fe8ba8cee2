use axum::{
    extract::Path,
    http::header,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json,
};
use log::info;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{JoinSchema, ValidatedJson},
    serialized::{Participant, Room, RoomDetails, ToSerialized},
    session::{session_cookie, MaybeSession},
    sse::room_events,
    Router,
};

#[utoipa::path(
    post,
    path = "/api/v1/rooms",
    tag = "rooms",
    responses(
        (status = 200, body = Room),
        (status = 503, description = "No free room code could be found")
    )
)]
pub(crate) async fn create_room(context: ServerContext) -> ServerResult<Json<Room>> {
    let room = context.collab.rooms.create_room().await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "The room code")),
    responses(
        (status = 200, body = RoomDetails),
        (status = 404, description = "Room not found")
    )
)]
pub(crate) async fn room(
    context: ServerContext,
    Path(code): Path<String>,
) -> ServerResult<Json<RoomDetails>> {
    let room = context.collab.rooms.room(&code)?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/v1/rooms/{code}/join",
    tag = "rooms",
    request_body = JoinSchema,
    params(("code" = String, Path, description = "The room code")),
    responses(
        (status = 200, body = Participant, description = "Joined, or the name is already taken. The session and its cookie are only sent to the participant's own client."),
        (status = 400, description = "The name is empty or too long"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room is full")
    )
)]
pub(crate) async fn join_room(
    context: ServerContext,
    MaybeSession(session): MaybeSession,
    Path(code): Path<String>,
    ValidatedJson(body): ValidatedJson<JoinSchema>,
) -> ServerResult<impl IntoResponse> {
    let joined = context
        .collab
        .rooms
        .join_room(&code, &body.name, session.as_deref())?;

    let cookies: Vec<_> = match joined.session() {
        Some(issued) => {
            if session.as_deref() != Some(issued) {
                info!("Issued a session to {}", joined.participant().name);
            }

            vec![(header::SET_COOKIE, session_cookie(issued))]
        }
        None => {
            info!(
                "Name {} is taken in room {}, withholding its session",
                joined.participant().name,
                code
            );

            vec![]
        }
    };

    let participant: Participant = joined.to_serialized();

    Ok((AppendHeaders(cookies), Json(participant)))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_room))
        .route("/:code", get(room))
        .route("/:code/join", post(join_room))
        .route("/:code/events", get(room_events))
}
