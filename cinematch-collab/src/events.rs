use crossbeam::channel::{Receiver, Sender};

use crate::{MatchData, ParticipantData, RoomCode, VoteData};

pub type EventSender = Sender<CollabEvent>;
pub type EventReceiver = Receiver<CollabEvent>;

/// Events emitted by rooms, consumed by whoever pushes updates to clients.
#[derive(Debug, Clone)]
pub enum CollabEvent {
    /// A participant joined a room for the first time
    ParticipantJoined {
        code: RoomCode,
        participant: ParticipantData,
    },
    /// A participant voted on a movie, or changed their vote
    VoteCast { code: RoomCode, vote: VoteData },
    /// A vote completed a match that did not exist before it
    MatchFound { code: RoomCode, found: MatchData },
    /// The room was evicted and will not accept any more requests
    RoomClosed { code: RoomCode },
}

impl CollabEvent {
    /// The room the event belongs to
    pub fn code(&self) -> &RoomCode {
        match self {
            Self::ParticipantJoined { code, .. } => code,
            Self::VoteCast { code, .. } => code,
            Self::MatchFound { code, .. } => code,
            Self::RoomClosed { code } => code,
        }
    }
}
