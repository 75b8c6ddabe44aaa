pub mod aggregator;
pub mod config;
pub mod model;
pub mod platform;
pub mod publisher;
pub mod reddit;
pub mod report;
pub mod scheduler;
pub mod task;
pub mod types;
pub mod utils;

pub use aggregator::{aggregate, AggregateOptions};
pub use config::{BotConfig, CommentMode, Mode, Targets};
pub use model::{Question, Reply, User, UserRegistry};
pub use platform::PlatformClient;
pub use publisher::{publish, PublishOutcome};
pub use reddit::RedditClient;
pub use report::{Report, ReportBuilder};
pub use scheduler::every;
pub use task::{run_all, run_once, run_tick, TickOutcome};
pub use types::{BotError, Comment, Result, TargetSpec, ThreadHandle};
