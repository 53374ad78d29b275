/// Limits applied by the relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Most names registered at once.
    pub max_peers: usize,
    /// Token bucket size per connection.
    pub burst: f64,
    /// Token bucket refill per second. A host relaying 30 Hz movement to
    /// five clients needs at least 180.
    pub messages_per_sec: f64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_peers: 1000,
            burst: 240.0,
            messages_per_sec: 240.0,
        }
    }
}
