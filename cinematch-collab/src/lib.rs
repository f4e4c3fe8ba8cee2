mod catalog;
mod config;
mod events;
mod id;
mod rooms;
mod util;
mod votes;

use std::{sync::Arc, time::Duration};

use crossbeam::channel::unbounded;
use dashmap::DashMap;
use tokio::task::JoinHandle;

pub use catalog::*;
pub use config::*;
pub use events::*;
pub use id::*;
pub use rooms::*;
pub use util::*;
pub use votes::*;

/// A concurrent map of shared values
pub type Store<K, T> = Arc<DashMap<K, Arc<T>>>;

/// The cinematch collab system, coordinating rooms, votes, and matches.
pub struct Collab {
    context: CollabContext,
    event_receiver: EventReceiver,

    pub rooms: RoomManager,
}

/// A type passed to various components of the collab system, to access state and emit events.
#[derive(Clone)]
pub struct CollabContext {
    pub config: Config,
    pub catalog: Arc<dyn Catalog>,
    event_sender: EventSender,

    pub rooms: Store<RoomCode, Room>,
}

impl Collab {
    pub fn new(config: Config, catalog: Arc<dyn Catalog>) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let context = CollabContext {
            config,
            catalog,
            event_sender,
            rooms: Default::default(),
        };

        let room_manager = RoomManager::new(&context);

        Self {
            context,
            event_receiver,
            rooms: room_manager,
        }
    }

    /// Blocks until the next event is emitted
    pub fn wait_for_event(&self) -> Option<CollabEvent> {
        self.event_receiver.recv().ok()
    }

    /// Starts evicting idle rooms in the background, as configured
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let Config {
            room_ttl,
            sweep_interval,
            ..
        } = self.context.config;

        spawn_sweeper(self.rooms.clone(), room_ttl, sweep_interval.max(Duration::from_secs(1)))
    }
}

impl CollabContext {
    pub fn event_sender(&self) -> EventSender {
        self.event_sender.clone()
    }
}
