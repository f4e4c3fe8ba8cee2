//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cinematch_collab::{
    Joined, MatchData, MovieData, ParticipantData, Room as CollabRoom, RoomData, VoteData,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Room {
    id: u64,
    code: String,
    created_at: DateTime<Utc>,
    is_active: bool,
}

/// A room along with who is in it
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomDetails {
    id: u64,
    code: String,
    created_at: DateTime<Utc>,
    is_active: bool,
    capacity: usize,
    participants: Vec<Member>,
}

/// The participant a join resolved to
#[derive(Debug, Serialize, ToSchema)]
pub struct Participant {
    id: u64,
    name: String,
    /// Only present when the participant belongs to the caller
    session_id: Option<String>,
}

/// A participant as seen by others in the room
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Member {
    id: u64,
    name: String,
    joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Movie {
    id: u32,
    title: String,
    year: Option<i32>,
    genre: Option<String>,
    poster_url: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Vote {
    id: u64,
    movie_id: u32,
    participant_id: u64,
    liked: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Match {
    movie: Movie,
    /// Names of everyone who liked the movie, in join order
    participants: Vec<String>,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Room> for RoomData {
    fn to_serialized(&self) -> Room {
        Room {
            id: self.id.value(),
            code: self.code.to_string(),
            created_at: self.created_at,
            is_active: self.is_active,
        }
    }
}

impl ToSerialized<Room> for Arc<CollabRoom> {
    fn to_serialized(&self) -> Room {
        self.data().to_serialized()
    }
}

impl ToSerialized<RoomDetails> for Arc<CollabRoom> {
    fn to_serialized(&self) -> RoomDetails {
        let data = self.data();

        RoomDetails {
            id: data.id.value(),
            code: data.code.to_string(),
            created_at: data.created_at,
            is_active: data.is_active,
            capacity: data.capacity,
            participants: data.participants.to_serialized(),
        }
    }
}

impl ToSerialized<Participant> for Joined {
    fn to_serialized(&self) -> Participant {
        let participant = self.participant();

        Participant {
            id: participant.id.value(),
            name: participant.name.clone(),
            session_id: self.session().map(str::to_string),
        }
    }
}

impl ToSerialized<Member> for ParticipantData {
    fn to_serialized(&self) -> Member {
        Member {
            id: self.id.value(),
            name: self.name.clone(),
            joined_at: self.joined_at,
        }
    }
}

impl ToSerialized<Movie> for MovieData {
    fn to_serialized(&self) -> Movie {
        Movie {
            id: self.id,
            title: self.title.clone(),
            year: self.year,
            genre: self.genre.clone(),
            poster_url: self.poster_url.clone(),
            description: self.description.clone(),
        }
    }
}

impl ToSerialized<Vote> for VoteData {
    fn to_serialized(&self) -> Vote {
        Vote {
            id: self.id.value(),
            movie_id: self.movie_id,
            participant_id: self.participant_id.value(),
            liked: self.liked,
        }
    }
}

impl ToSerialized<Match> for MatchData {
    fn to_serialized(&self) -> Match {
        Match {
            movie: self.movie.to_serialized(),
            participants: self.participants.clone(),
        }
    }
}
