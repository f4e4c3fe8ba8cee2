use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    movies, rooms,
    schemas::{JoinSchema, VoteSchema},
    serialized::{Match, Member, Movie, Participant, Room, RoomDetails, Vote},
    session::SESSION_COOKIE,
    sse::{self, ServerEvent},
    votes, Health,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        rooms::create_room,
        rooms::room,
        rooms::join_room,
        sse::room_events,
        movies::movies,
        movies::unvoted_movies,
        votes::cast_vote,
        votes::matches,
        crate::health,
    ),
    components(schemas(
        Room,
        RoomDetails,
        Participant,
        Member,
        Movie,
        Vote,
        Match,
        JoinSchema,
        VoteSchema,
        ServerEvent,
        Health
    )),
    modifiers(&Security),
    info(
        description = "cinematch-server coordinates rooms where participants swipe through movies until they agree on one"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <session>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
            components.add_security_scheme(
                "SessionCookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
