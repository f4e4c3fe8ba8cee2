use axum::{extract::Query, routing::get, Json};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::CodeQuery,
    serialized::{Movie, ToSerialized},
    session::ParticipantSession,
    Router,
};

#[utoipa::path(
    get,
    path = "/api/v1/movies",
    tag = "movies",
    params(CodeQuery),
    responses(
        (status = 200, body = Vec<Movie>, description = "The room's movies, always in the same order"),
        (status = 404, description = "Room not found")
    )
)]
pub(crate) async fn movies(
    context: ServerContext,
    Query(query): Query<CodeQuery>,
) -> ServerResult<Json<Vec<Movie>>> {
    let movies = context.collab.rooms.movies(&query.code)?;

    Ok(Json(movies.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/v1/movies/unvoted",
    tag = "movies",
    params(CodeQuery),
    security(("SessionCookie" = []), ("BearerAuth" = [])),
    responses(
        (status = 200, body = Vec<Movie>, description = "Movies the caller hasn't voted on yet"),
        (status = 403, description = "Not a participant in this room"),
        (status = 404, description = "Room not found")
    )
)]
pub(crate) async fn unvoted_movies(
    context: ServerContext,
    ParticipantSession(session): ParticipantSession,
    Query(query): Query<CodeQuery>,
) -> ServerResult<Json<Vec<Movie>>> {
    let movies = context.collab.rooms.unvoted_movies(&query.code, &session)?;

    Ok(Json(movies.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(movies))
        .route("/unvoted", get(unvoted_movies))
}
