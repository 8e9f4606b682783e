//! Order orchestration, risk control and background bookkeeping.

mod clock;
mod debounce;
mod execution;
mod line;
mod listener;
mod notifier;
mod pnl;
mod risk;
mod scheduler;
mod setup;
mod sizing;

pub use clock::{Clock, SystemClock};
pub use debounce::{DebounceGate, DebounceRecord, DEFAULT_WINDOW_SECS};
pub use execution::{
    ExecutionReport, OrderOrchestrator, OrderOutcome, OrderState, ProtectionStatus,
};
pub use line::{LineConfig, LineNotifier, DEFAULT_LINE_NOTIFY_URL};
pub use listener::{EventStreamListener, ListenerExit};
pub use notifier::{
    Event, FillEvent, LogNotifier, Notifier, NotifierRegistry, NullNotifier, PnlEvent,
    ProtectionEvent,
};
pub use pnl::{default_day_end, PnlAggregator};
pub use risk::{PositionRiskEvaluator, RiskCheckResult};
pub(crate) use scheduler::wait_for_shutdown;
pub use scheduler::{next_report_at, next_report_delay, SchedulerLoop, DEFAULT_KEEPALIVE_INTERVAL};
pub use setup::{SetupOutcome, TradeSetupCoordinator};
pub use sizing::QuantitySizer;
