use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::{
    compute_matches, events::CollabEvent, is_match, random_string, util::is_valid_session,
    Config, EventSender, Id, MatchData, MovieData, MovieId, VoteData, VoteTable, SESSION_LENGTH,
};

use super::{Joined, ParticipantData, RoomCode, RoomError};

pub type RoomId = Id<Room>;

/// Longest name a participant can join with
pub const MAX_NAME_LENGTH: usize = 50;

/// A room, containing its participants, its movie list, and their votes.
///
/// All mutable state sits behind one lock, so joins, votes and match queries
/// on the same room never observe each other half-way.
pub struct Room {
    id: RoomId,
    code: RoomCode,
    created_at: DateTime<Utc>,
    movies: Arc<[MovieData]>,
    config: Config,
    events: EventSender,
    state: Mutex<RoomState>,
}

struct RoomState {
    /// Set by eviction. A closed room refuses every operation.
    closed: bool,
    last_activity: Instant,
    /// In join order
    participants: Vec<ParticipantData>,
    votes: VoteTable,
}

/// A snapshot of a room
#[derive(Debug, Clone)]
pub struct RoomData {
    pub id: RoomId,
    pub code: RoomCode,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub capacity: usize,
    pub participants: Vec<ParticipantData>,
}

impl RoomState {
    fn participant_by_session(&self, session: &str) -> Option<&ParticipantData> {
        self.participants.iter().find(|p| p.session == session)
    }

    fn participant_by_name(&self, name: &str) -> Option<&ParticipantData> {
        self.participants.iter().find(|p| p.name == name)
    }
}

impl Room {
    pub fn new(code: RoomCode, movies: Arc<[MovieData]>, config: Config, events: EventSender) -> Self {
        Self {
            id: RoomId::new(),
            code,
            created_at: Utc::now(),
            movies,
            config,
            events,
            state: Mutex::new(RoomState {
                closed: false,
                last_activity: Instant::now(),
                participants: Default::default(),
                votes: Default::default(),
            }),
        }
    }

    /// Locks the room state, failing if the room was evicted. Counts as activity.
    fn lock_open(&self) -> Result<MutexGuard<'_, RoomState>, RoomError> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(RoomError::not_found("room", self.code.as_str()));
        }

        state.last_activity = Instant::now();
        Ok(state)
    }

    fn emit(&self, event: CollabEvent) {
        if self.events.send(event).is_err() {
            warn!("Event from room {} was dropped, nobody is listening", self.code);
        }
    }

    /// Adds a participant to the room.
    ///
    /// Joining again with a session or a name that is already in the room
    /// returns the existing participant instead of failing. Only a caller
    /// presenting the participant's session gets it back.
    pub fn join(&self, name: &str, session: Option<&str>) -> Result<Joined, RoomError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(RoomError::InvalidInput("name is empty".to_string()));
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(RoomError::InvalidInput(format!(
                "name is longer than {MAX_NAME_LENGTH} characters"
            )));
        }

        let session = session.filter(|s| is_valid_session(s));
        let mut state = self.lock_open()?;

        if let Some(existing) = session.and_then(|s| state.participant_by_session(s)) {
            return Ok(Joined::Caller(existing.clone()));
        }

        if let Some(existing) = state.participant_by_name(name) {
            return Ok(Joined::Existing(existing.clone()));
        }

        if state.participants.len() >= self.config.room_capacity {
            return Err(RoomError::RoomFull);
        }

        let session = session
            .map(str::to_string)
            .unwrap_or_else(|| random_string(SESSION_LENGTH));

        let participant = ParticipantData::new(name.to_string(), session);
        state.participants.push(participant.clone());

        info!("{} joined room {}", participant.name, self.code);

        self.emit(CollabEvent::ParticipantJoined {
            code: self.code.clone(),
            participant: participant.clone(),
        });

        Ok(Joined::Caller(participant))
    }

    /// Returns the participant the session belongs to
    pub fn participant_by_session(&self, session: &str) -> Result<ParticipantData, RoomError> {
        let state = self.lock_open()?;

        state
            .participant_by_session(session)
            .cloned()
            .ok_or(RoomError::NotAParticipant)
    }

    /// Records a vote of the participant owning the session, replacing an earlier vote on the same movie.
    pub fn cast_vote(&self, session: &str, movie_id: MovieId, liked: bool) -> Result<VoteData, RoomError> {
        let mut state = self.lock_open()?;

        let participant_id = state
            .participant_by_session(session)
            .map(|p| p.id)
            .ok_or(RoomError::NotAParticipant)?;

        let movie = self
            .movie_by_id(movie_id)
            .ok_or_else(|| RoomError::not_found("movie", movie_id))?;

        let quorum = self.config.match_quorum;
        let was_match = is_match(&state.votes, &state.participants, movie_id, quorum);
        let vote = state.votes.upsert(participant_id, movie_id, liked);
        let is_now_match = is_match(&state.votes, &state.participants, movie_id, quorum);

        self.emit(CollabEvent::VoteCast {
            code: self.code.clone(),
            vote: vote.clone(),
        });

        if is_now_match && !was_match {
            info!("Room {} matched on {}", self.code, movie.title);

            self.emit(CollabEvent::MatchFound {
                code: self.code.clone(),
                found: MatchData {
                    movie: movie.clone(),
                    participants: state.participants.iter().map(|p| p.name.clone()).collect(),
                },
            });
        }

        Ok(vote)
    }

    /// Returns the current matches, ordered by movie id
    pub fn matches(&self) -> Result<Vec<MatchData>, RoomError> {
        let state = self.lock_open()?;

        Ok(compute_matches(
            &self.movies,
            &state.participants,
            &state.votes,
            self.config.match_quorum,
        ))
    }

    /// Returns the movie list, always in the same order
    pub fn movies(&self) -> Result<Vec<MovieData>, RoomError> {
        let _state = self.lock_open()?;

        Ok(self.movies.to_vec())
    }

    /// Returns the movies the participant owning the session hasn't voted on yet
    pub fn unvoted_movies(&self, session: &str) -> Result<Vec<MovieData>, RoomError> {
        let state = self.lock_open()?;

        let participant_id = state
            .participant_by_session(session)
            .map(|p| p.id)
            .ok_or(RoomError::NotAParticipant)?;

        Ok(self
            .movies
            .iter()
            .filter(|m| !state.votes.has_voted(participant_id, m.id))
            .cloned()
            .collect())
    }

    /// Closes the room if it has been idle for at least `ttl` as of `now`.
    /// Returns true if this call closed it.
    pub fn close_if_idle(&self, ttl: Duration, now: Instant) -> bool {
        let mut state = self.state.lock();

        if state.closed || now.saturating_duration_since(state.last_activity) < ttl {
            return false;
        }

        state.closed = true;

        info!(
            "Closing room {} after {} participant(s) and {} vote(s)",
            self.code,
            state.participants.len(),
            state.votes.len()
        );

        self.emit(CollabEvent::RoomClosed {
            code: self.code.clone(),
        });

        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn movie_by_id(&self, movie_id: MovieId) -> Option<&MovieData> {
        self.movies.iter().find(|m| m.id == movie_id)
    }

    pub fn data(&self) -> RoomData {
        let state = self.state.lock();

        RoomData {
            id: self.id,
            code: self.code.clone(),
            created_at: self.created_at,
            is_active: !state.closed,
            capacity: self.config.room_capacity,
            participants: state.participants.clone(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }
}
