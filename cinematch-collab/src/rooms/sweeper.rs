use std::time::Duration;

use log::info;
use tokio::{task::JoinHandle, time};

use super::RoomManager;

/// Periodically evicts rooms that have been idle for at least `ttl`.
pub fn spawn_sweeper(rooms: RoomManager, ttl: Duration, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let evicted = rooms.evict_idle(ttl);

            if !evicted.is_empty() {
                let codes: Vec<_> = evicted.iter().map(|c| c.as_str()).collect();
                info!("Evicted {} idle room(s): {}", evicted.len(), codes.join(", "));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Collab, Config, StaticCatalog};

    #[tokio::test]
    async fn test_sweeper_evicts_idle_rooms() {
        let collab = Collab::new(Config::default(), Arc::new(StaticCatalog::default()));
        collab.rooms.create_room_with_code("AB12").await.unwrap();

        let handle = spawn_sweeper(collab.rooms.clone(), Duration::ZERO, Duration::from_millis(10));
        time::sleep(Duration::from_millis(100)).await;

        assert!(collab.rooms.list_all().is_empty());
        handle.abort();
    }
}
