use chrono::{DateTime, Utc};

use crate::Id;

pub type ParticipantId = Id<ParticipantData>;

/// Someone who joined a room under a name
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantData {
    pub id: ParticipantId,
    pub name: String,
    /// The token the client presents to vote as this participant
    pub session: String,
    pub joined_at: DateTime<Utc>,
}

impl ParticipantData {
    pub fn new(name: String, session: String) -> Self {
        Self {
            id: ParticipantId::new(),
            name,
            session,
            joined_at: Utc::now(),
        }
    }
}

/// Who a join resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Joined {
    /// The caller joined now, or presented the session of an earlier join
    Caller(ParticipantData),
    /// The name is taken by a participant joined under another session.
    /// The caller must not learn that session.
    Existing(ParticipantData),
}

impl Joined {
    pub fn participant(&self) -> &ParticipantData {
        match self {
            Self::Caller(participant) | Self::Existing(participant) => participant,
        }
    }

    pub fn into_participant(self) -> ParticipantData {
        match self {
            Self::Caller(participant) | Self::Existing(participant) => participant,
        }
    }

    /// The session the caller may act under, if the participant is theirs
    pub fn session(&self) -> Option<&str> {
        match self {
            Self::Caller(participant) => Some(&participant.session),
            Self::Existing(_) => None,
        }
    }
}
