mod activation;
mod config;
pub mod context;
mod error;
mod history;
mod window;

pub use activation::{ActivationResult, SearchScope, StrategyKind};
pub use config::{DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_RETRIES, TrackerConfig};
pub use context::{
    ActivityPattern, AppUsage, ContextReport, ContextSynthesizer, IntentPrediction, SystemLoad,
    TimeBucket, WorkflowTag,
};
pub use error::{TrackerError, TrackerResult};
pub use history::RecencyHistory;
pub use window::{EnumeratedWindow, WindowHandle, WindowIdentity, WindowRect, WindowSnapshot};
