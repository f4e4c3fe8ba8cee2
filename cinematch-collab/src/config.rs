use std::time::Duration;

/// The configuration of the room coordinator
#[derive(Debug, Clone)]
pub struct Config {
    /// How many participants can join a single room
    pub room_capacity: usize,
    /// How many participants a room needs before anything can match
    pub match_quorum: usize,
    /// How many random codes are tried before room creation gives up
    pub max_code_attempts: usize,
    /// How long a room may sit without activity before it is evicted
    pub room_ttl: Duration,
    /// How often idle rooms are swept
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Two people deciding on a movie
            room_capacity: 2,
            match_quorum: 2,
            max_code_attempts: 10,
            // A movie night rarely lasts longer
            room_ttl: Duration::from_secs(60 * 60 * 6),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
