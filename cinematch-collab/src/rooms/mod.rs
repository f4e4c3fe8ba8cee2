mod code;
mod participant;
mod room;
mod sweeper;

use std::{sync::Arc, time::Duration, time::Instant};

use dashmap::mapref::entry::Entry;
use log::{info, warn};
use rand::thread_rng;
use thiserror::Error;

use crate::{CatalogError, CollabContext, MatchData, MovieData, MovieId, VoteData};

pub use code::*;
pub use participant::*;
pub use room::*;
pub use sweeper::*;

#[derive(Debug, Error)]
pub enum RoomError {
    /// The room or movie doesn't exist, or the room was evicted
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Room is full")]
    RoomFull,
    #[error("Not a participant in this room")]
    NotAParticipant,
    #[error("Room with code {0} already exists")]
    Conflict(RoomCode),
    #[error("Could not generate a unique room code")]
    ServiceUnavailable,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RoomError {
    pub fn not_found(resource: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            resource,
            identifier: identifier.to_string(),
        }
    }
}

/// Creates, looks up and evicts rooms.
#[derive(Clone)]
pub struct RoomManager {
    context: CollabContext,
}

impl RoomManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    async fn movie_list(&self) -> Result<Arc<[MovieData]>, RoomError> {
        let movies = self.context.catalog.movies().await?;
        Ok(movies.into())
    }

    fn build_room(&self, code: RoomCode, movies: Arc<[MovieData]>) -> Arc<Room> {
        Arc::new(Room::new(
            code,
            movies,
            self.context.config.clone(),
            self.context.event_sender(),
        ))
    }

    /// Creates a new room under a random code that no live room uses
    pub async fn create_room(&self) -> Result<Arc<Room>, RoomError> {
        let movies = self.movie_list().await?;

        if self.context.rooms.len() >= RoomCode::SPACE {
            warn!("Every room code is taken");
            return Err(RoomError::ServiceUnavailable);
        }

        let mut rng = thread_rng();

        for _ in 0..self.context.config.max_code_attempts {
            let code = RoomCode::random(&mut rng);

            // The entry holds the shard lock, so nobody else can claim the code in between
            if let Entry::Vacant(entry) = self.context.rooms.entry(code.clone()) {
                let room = self.build_room(code, movies);
                entry.insert(room.clone());

                info!("Created room {}", room.code());
                return Ok(room);
            }
        }

        warn!(
            "No free room code found after {} attempts",
            self.context.config.max_code_attempts
        );

        Err(RoomError::ServiceUnavailable)
    }

    /// Creates a room under a chosen code
    pub async fn create_room_with_code(&self, code: &str) -> Result<Arc<Room>, RoomError> {
        let code = RoomCode::parse(code).map_err(|e| match e {
            RoomError::NotFound { identifier, .. } => {
                RoomError::InvalidInput(format!("{identifier} is not a valid room code"))
            }
            e => e,
        })?;

        let movies = self.movie_list().await?;

        match self.context.rooms.entry(code.clone()) {
            Entry::Occupied(_) => Err(RoomError::Conflict(code)),
            Entry::Vacant(entry) => {
                let room = self.build_room(code, movies);
                entry.insert(room.clone());

                info!("Created room {}", room.code());
                Ok(room)
            }
        }
    }

    /// Returns a live room by its code
    pub fn room(&self, code: &str) -> Result<Arc<Room>, RoomError> {
        let code = RoomCode::parse(code)?;

        self.context
            .rooms
            .get(&code)
            .map(|r| r.value().clone())
            .filter(|r| !r.is_closed())
            .ok_or_else(|| RoomError::not_found("room", code))
    }

    pub fn join_room(
        &self,
        code: &str,
        name: &str,
        session: Option<&str>,
    ) -> Result<Joined, RoomError> {
        self.room(code)?.join(name, session)
    }

    pub fn cast_vote(
        &self,
        code: &str,
        session: &str,
        movie_id: MovieId,
        liked: bool,
    ) -> Result<VoteData, RoomError> {
        self.room(code)?.cast_vote(session, movie_id, liked)
    }

    pub fn matches(&self, code: &str) -> Result<Vec<MatchData>, RoomError> {
        self.room(code)?.matches()
    }

    pub fn movies(&self, code: &str) -> Result<Vec<MovieData>, RoomError> {
        self.room(code)?.movies()
    }

    pub fn unvoted_movies(&self, code: &str, session: &str) -> Result<Vec<MovieData>, RoomError> {
        self.room(code)?.unvoted_movies(session)
    }

    /// Get all rooms in memory
    pub fn list_all(&self) -> Vec<Arc<Room>> {
        self.context.rooms.iter().map(|r| r.value().clone()).collect()
    }

    /// Closes and removes every room that has been idle for at least `ttl`.
    /// Returns the codes of the evicted rooms.
    pub fn evict_idle(&self, ttl: Duration) -> Vec<RoomCode> {
        let now = Instant::now();
        let mut evicted = Vec::new();

        for room in self.list_all() {
            if !room.close_if_idle(ttl, now) {
                continue;
            }

            self.context
                .rooms
                .remove_if(room.code(), |_, current| Arc::ptr_eq(current, &room));

            evicted.push(room.code().clone());
        }

        evicted
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{Collab, Config, StaticCatalog};

    fn collab() -> Collab {
        Collab::new(Config::default(), Arc::new(StaticCatalog::default()))
    }

    #[tokio::test]
    async fn test_create_room_assigns_unique_codes() {
        let collab = collab();
        let first = collab.rooms.create_room().await.unwrap();
        let second = collab.rooms.create_room().await.unwrap();

        assert_ne!(first.code(), second.code());
        assert_eq!(first.code().as_str().len(), RoomCode::LENGTH);
        assert_eq!(collab.rooms.list_all().len(), 2);
    }

    #[tokio::test]
    async fn test_create_room_with_taken_code_conflicts() {
        let collab = collab();
        collab.rooms.create_room_with_code("ab12").await.unwrap();

        let result = collab.rooms.create_room_with_code("AB12").await;
        assert!(matches!(result, Err(RoomError::Conflict(_))));

        let result = collab.rooms.create_room_with_code("nope!").await;
        assert!(matches!(result, Err(RoomError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_exhausted_code_attempts_are_unavailable() {
        let config = Config {
            max_code_attempts: 0,
            ..Default::default()
        };
        let collab = Collab::new(config, Arc::new(StaticCatalog::default()));

        assert!(matches!(
            collab.rooms.create_room().await,
            Err(RoomError::ServiceUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_lookups_are_case_insensitive() {
        let collab = collab();
        collab.rooms.create_room_with_code("AB12").await.unwrap();

        assert!(collab.rooms.room("ab12").is_ok());
        assert!(matches!(
            collab.rooms.room("ZZ99"),
            Err(RoomError::NotFound { resource: "room", .. })
        ));
        assert!(matches!(
            collab.rooms.room(""),
            Err(RoomError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_join_unknown_room_is_not_found() {
        let collab = collab();

        assert!(matches!(
            collab.rooms.join_room("QQQQ", "Alice", None),
            Err(RoomError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_movies_are_stable_across_calls() {
        let collab = collab();
        let room = collab.rooms.create_room().await.unwrap();
        let code = room.code().to_string();

        collab.rooms.join_room(&code, "Alice", None).unwrap();

        let first = collab.rooms.movies(&code).unwrap();
        let second = collab.rooms.movies(&code).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 50);
    }

    #[tokio::test]
    async fn test_pairwise_scenario() {
        let collab = collab();
        collab.rooms.create_room_with_code("AB12").await.unwrap();

        let alice = collab.rooms.join_room("AB12", "Alice", None).unwrap().into_participant();
        let bob = collab.rooms.join_room("AB12", "Bob", None).unwrap().into_participant();

        collab.rooms.cast_vote("AB12", &alice.session, 1, true).unwrap();
        collab.rooms.cast_vote("AB12", &bob.session, 1, true).unwrap();

        let matches = collab.rooms.matches("AB12").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].movie.id, 1);
        assert_eq!(matches[0].participants, vec!["Alice", "Bob"]);

        collab.rooms.cast_vote("AB12", &bob.session, 2, false).unwrap();
        collab.rooms.cast_vote("AB12", &alice.session, 2, true).unwrap();

        let matches = collab.rooms.matches("AB12").unwrap();
        assert_eq!(matches.len(), 1, "movie 2 must not match");
        assert_eq!(
            matches,
            collab.rooms.matches("ab12").unwrap(),
            "repeated queries agree"
        );

        assert!(matches!(
            collab.rooms.cast_vote("AB12", "not-joined", 1, true),
            Err(RoomError::NotAParticipant)
        ));
    }

    #[tokio::test]
    async fn test_repeated_vote_is_idempotent() {
        let collab = collab();
        collab.rooms.create_room_with_code("AB12").await.unwrap();
        let alice = collab.rooms.join_room("AB12", "Alice", None).unwrap().into_participant();
        let bob = collab.rooms.join_room("AB12", "Bob", None).unwrap().into_participant();

        collab.rooms.cast_vote("AB12", &bob.session, 4, true).unwrap();
        let first = collab.rooms.cast_vote("AB12", &alice.session, 4, true).unwrap();
        let matches_once = collab.rooms.matches("AB12").unwrap();

        let second = collab.rooms.cast_vote("AB12", &alice.session, 4, true).unwrap();
        let matches_twice = collab.rooms.matches("AB12").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.liked, second.liked);
        assert_eq!(matches_once, matches_twice);
    }

    #[tokio::test]
    async fn test_concurrent_votes_are_not_lost() {
        let collab = collab();
        collab.rooms.create_room_with_code("AB12").await.unwrap();
        let alice = collab.rooms.join_room("AB12", "Alice", None).unwrap().into_participant();
        let bob = collab.rooms.join_room("AB12", "Bob", None).unwrap().into_participant();

        let handles: Vec<_> = [alice, bob]
            .into_iter()
            .map(|participant| {
                let rooms = collab.rooms.clone();

                thread::spawn(move || {
                    for movie_id in 1..=50 {
                        rooms
                            .cast_vote("AB12", &participant.session, movie_id, true)
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let matches = collab.rooms.matches("AB12").unwrap();
        assert_eq!(matches.len(), 50, "every vote from both threads should land");
    }

    #[tokio::test]
    async fn test_evict_idle_rooms() {
        let collab = collab();
        let room = collab.rooms.create_room_with_code("AB12").await.unwrap();

        assert!(collab.rooms.evict_idle(Duration::from_secs(3600)).is_empty());

        let evicted = collab.rooms.evict_idle(Duration::ZERO);
        assert_eq!(evicted, vec![room.code().clone()]);
        assert!(collab.rooms.list_all().is_empty());

        // A handle taken before eviction sees the room as gone
        assert!(matches!(
            room.join("Alice", None),
            Err(RoomError::NotFound { .. })
        ));
        assert!(matches!(
            collab.rooms.room("AB12"),
            Err(RoomError::NotFound { .. })
        ));

        // The code is free again
        assert!(collab.rooms.create_room_with_code("AB12").await.is_ok());
    }
}
