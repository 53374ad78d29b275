pub mod arena;
pub mod bots;
pub mod combat;
pub mod config;
pub mod entities;
pub mod events;
pub mod geometry;
pub mod input;
pub mod player;
pub mod round;
pub mod scheduler;
pub mod session;
pub mod sync;
pub mod teams;
pub mod transport;
pub mod weapon;

pub use config::GameConfig;
pub use events::SessionEvent;
pub use input::InputFrame;
pub use session::{Session, Stage};
pub use transport::{Transport, TransportError, TransportEvent};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::arena::Arena;
    use crate::config::GameConfig;
    use crate::session::Session;

    /// 60 Hz frame.
    pub const FRAME: f32 = 1.0 / 60.0;

    /// Default config with a fixed seed.
    pub fn seeded_config() -> GameConfig {
        GameConfig {
            seed: Some(7),
            ..GameConfig::default()
        }
    }

    /// A session on an arena with no walls.
    pub fn open_session() -> Session {
        Session::new(seeded_config(), Arena::empty("open"))
    }
}
