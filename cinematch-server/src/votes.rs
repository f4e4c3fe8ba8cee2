use axum::{
    extract::Query,
    routing::{get, post},
    Json,
};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{CodeQuery, ValidatedJson, VoteSchema},
    serialized::{Match, ToSerialized, Vote},
    session::ParticipantSession,
    Router,
};

#[utoipa::path(
    post,
    path = "/api/v1/votes",
    tag = "votes",
    request_body = VoteSchema,
    params(CodeQuery),
    security(("SessionCookie" = []), ("BearerAuth" = [])),
    responses(
        (status = 200, body = Vote, description = "The vote was recorded, replacing an earlier one on the same movie"),
        (status = 403, description = "Not a participant in this room"),
        (status = 404, description = "Room or movie not found")
    )
)]
pub(crate) async fn cast_vote(
    context: ServerContext,
    ParticipantSession(session): ParticipantSession,
    Query(query): Query<CodeQuery>,
    ValidatedJson(body): ValidatedJson<VoteSchema>,
) -> ServerResult<Json<Vote>> {
    let vote = context
        .collab
        .rooms
        .cast_vote(&query.code, &session, body.movie_id, body.liked)?;

    Ok(Json(vote.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/v1/votes/matches",
    tag = "votes",
    params(CodeQuery),
    responses(
        (status = 200, body = Vec<Match>, description = "Movies every participant liked, ordered by movie id"),
        (status = 404, description = "Room not found")
    )
)]
pub(crate) async fn matches(
    context: ServerContext,
    Query(query): Query<CodeQuery>,
) -> ServerResult<Json<Vec<Match>>> {
    let matches = context.collab.rooms.matches(&query.code)?;

    Ok(Json(matches.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(cast_vote))
        .route("/matches", get(matches))
}
