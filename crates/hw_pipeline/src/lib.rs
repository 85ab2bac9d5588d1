pub mod cycle;
pub mod logging;
pub mod publisher;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use cycle::{CycleReport, PollCycle};
pub use logging::{init_logging, parse_level, Logger};
pub use publisher::{PublishConfig, PublishPolicy, PublishReport};
pub use runner::{spawn_shutdown_listener, PollLoop, MIN_POLL_INTERVAL};

pub mod prelude {
    pub use super::cycle::PollCycle;
    pub use super::publisher::{PublishConfig, PublishPolicy};
    pub use super::runner::PollLoop;
    pub use hw_core::{Article, Checkpoint, Error, Result};
}
