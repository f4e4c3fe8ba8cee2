use axum::{
    extract::Path,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use cinematch_collab::{Collab, CollabEvent, Id, RoomCode};
use futures_util::Stream;
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::VecDeque,
    convert::Infallible,
    pin::Pin,
    sync::{Arc, Weak},
    task::{Context, Poll, Waker},
    thread::{self, JoinHandle},
};
use utoipa::ToSchema;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    serialized::{Match, Member, ToSerialized},
};

type ConnectionId = Id<Connection>;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
    /// Someone joined the room
    ParticipantJoined { code: String, participant: Member },
    /// A participant voted. Whether they liked the movie stays private.
    VoteCast {
        code: String,
        participant_id: u64,
        movie_id: u32,
    },
    /// Every participant liked a movie
    MatchFound { code: String, found: Match },
    /// The room was evicted after being idle, no more events will follow
    RoomClosed { code: String },
}

impl ServerEvent {
    pub fn code(&self) -> &str {
        match self {
            Self::ParticipantJoined { code, .. } => code,
            Self::VoteCast { code, .. } => code,
            Self::MatchFound { code, .. } => code,
            Self::RoomClosed { code } => code,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ParticipantJoined { .. } => "participant-joined",
            Self::VoteCast { .. } => "vote-cast",
            Self::MatchFound { .. } => "match-found",
            Self::RoomClosed { .. } => "room-closed",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::RoomClosed { .. })
    }
}

impl From<CollabEvent> for ServerEvent {
    fn from(value: CollabEvent) -> Self {
        match value {
            CollabEvent::ParticipantJoined { code, participant } => Self::ParticipantJoined {
                code: code.to_string(),
                participant: participant.to_serialized(),
            },
            CollabEvent::VoteCast { code, vote } => Self::VoteCast {
                code: code.to_string(),
                participant_id: vote.participant_id.value(),
                movie_id: vote.movie_id,
            },
            CollabEvent::MatchFound { code, found } => Self::MatchFound {
                code: code.to_string(),
                found: found.to_serialized(),
            },
            CollabEvent::RoomClosed { code } => Self::RoomClosed {
                code: code.to_string(),
            },
        }
    }
}

/// Manages server sent event connections, each following a single room
pub struct ServerSentEvents {
    me: Weak<Self>,
    connections: Mutex<Vec<Connection>>,
}

struct Connection {
    id: ConnectionId,
    code: RoomCode,
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

pub struct ConnectionHandle {
    id: ConnectionId,
    /// Set once the final event of the room was sent
    finished: bool,
    /// A reference to [Connection]'s pending messages
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    /// A reference to [Connection]'s stored [Waker]
    waker: Arc<Mutex<Option<Waker>>>,
    /// Required to remove connection when dropped
    manager: Weak<ServerSentEvents>,
}

impl ServerSentEvents {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connections: Default::default(),
        })
    }

    /// Sends the event to every connection following its room
    pub fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.lock();

        for connection in connections.iter().filter(|c| c.code.as_str() == event.code()) {
            connection.send(event.clone())
        }
    }

    pub fn connect(&self, code: RoomCode) -> ConnectionHandle {
        let connection = Connection::new(code);
        let handle = connection.handle(self.me.clone());

        let mut connections = self.connections.lock();
        info!("Client is following room {}", connection.code);

        connections.push(connection);
        handle
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    fn disconnect(&self, id: ConnectionId) {
        self.connections.lock().retain(|c| c.id != id)
    }
}

impl Connection {
    fn new(code: RoomCode) -> Self {
        Self {
            id: ConnectionId::new(),
            code,
            pending_messages: Default::default(),
            waker: Default::default(),
        }
    }

    fn send(&self, message: ServerEvent) {
        self.pending_messages.lock().push_back(message);

        if let Some(waker) = self.waker.lock().take() {
            waker.wake()
        }
    }

    fn handle(&self, manager: Weak<ServerSentEvents>) -> ConnectionHandle {
        ConnectionHandle {
            id: self.id,
            finished: false,
            pending_messages: self.pending_messages.clone(),
            waker: self.waker.clone(),
            manager,
        }
    }
}

impl Stream for ConnectionHandle {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        let pending_messages = self.pending_messages.clone();
        let mut pending_messages = pending_messages.lock();

        while let Some(message) = pending_messages.pop_front() {
            match Event::default().event(message.name()).json_data(&message) {
                Ok(event) => {
                    self.finished = message.is_final();
                    return Poll::Ready(Some(Ok(event)));
                }
                Err(e) => warn!("Could not serialize {} event: {}", message.name(), e),
            }
        }

        // Registered while the queue is still locked, so a concurrent send can't slip in between
        *self.waker.lock() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.disconnect(self.id)
        }
    }
}

/// Pushes every collab event to the clients following its room
pub fn spawn_event_forwarder(collab: Arc<Collab>, sse: Arc<ServerSentEvents>) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Some(event) = collab.wait_for_event() {
            sse.broadcast(event.into());
        }
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms/{code}/events",
    tag = "rooms",
    params(("code" = String, Path, description = "The room code")),
    responses(
        (
            status = 200,
            content_type = "text/event-stream",
            description = "A stream of events happening in the room",
            body = ServerEvent
        ),
        (status = 404, description = "Room not found")
    )
)]
pub(crate) async fn room_events(
    context: ServerContext,
    Path(code): Path<String>,
) -> ServerResult<Sse<ConnectionHandle>> {
    let room = context.collab.rooms.room(&code)?;
    let handle = context.sse.connect(room.code().clone());

    Ok(Sse::new(handle).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    fn closed(code: &str) -> ServerEvent {
        ServerEvent::RoomClosed {
            code: code.to_string(),
        }
    }

    fn vote(code: &str) -> ServerEvent {
        ServerEvent::VoteCast {
            code: code.to_string(),
            participant_id: 1,
            movie_id: 7,
        }
    }

    #[tokio::test]
    async fn test_events_are_scoped_to_their_room() {
        let sse = ServerSentEvents::new();
        let mut handle = sse.connect(RoomCode::parse("AB12").unwrap());

        sse.broadcast(vote("ZZ99"));
        sse.broadcast(vote("AB12"));
        sse.broadcast(closed("AB12"));
        sse.broadcast(vote("AB12"));

        assert!(handle.next().await.is_some(), "vote in AB12");
        assert!(handle.next().await.is_some(), "room closed");
        assert!(handle.next().await.is_none(), "stream ends after the room closes");
    }

    #[test]
    fn test_dropped_handles_disconnect() {
        let sse = ServerSentEvents::new();
        let handle = sse.connect(RoomCode::parse("AB12").unwrap());

        assert_eq!(sse.connection_count(), 1);
        drop(handle);
        assert_eq!(sse.connection_count(), 0);
    }

    #[test]
    fn test_vote_events_hide_the_choice() {
        let json = serde_json::to_value(vote("AB12")).unwrap();

        assert_eq!(json["type"], "vote-cast");
        assert!(json.get("liked").is_none());
    }
}
