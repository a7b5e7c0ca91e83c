pub mod cooldown;
pub mod dispatcher;
pub mod lifecycle;
pub mod projector;
pub mod relay;

pub use cooldown::CooldownGate;
pub use dispatcher::FanoutDispatcher;
pub use lifecycle::{JoinError, LeaveError, LifecycleManager};
pub use projector::{ProjectError, Projector, TRUNCATION_MARKER};
pub use relay::{RelayOutcome, RelayService};
