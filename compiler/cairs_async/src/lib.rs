//! CAIRS Async - concurrency primitives, the cooperative task scheduler, and
//! the PIR evaluator (§4.8 C9, §4.9 C10, §4.10 C11).
//!
//! [`evaluate_pir`] is the document-level entry point: it builds an
//! [`AsyncEvaluator`] and installs it as a [`cairs_eval::PirHook`] on a
//! [`cairs_eval::Evaluator`], so `spawn`/`await`/channel nodes reduce through
//! the scheduler while every other node kind still goes through the exact
//! evaluator C7 built. `evaluate`'s document-level dispatch (§4.11 C12) picks
//! this entry point over `cairs_eval::evaluate` whenever `doc.layer` is
//! `Pir`.

pub mod barrier;
pub mod channel;
pub mod effect_log;
pub mod mutex;
pub mod pir_eval;
pub mod scheduler;
pub mod store;

pub use barrier::AsyncBarrier;
pub use channel::{AsyncChannel, ChannelType};
pub use effect_log::{ConcurrentEffectLog, EffectStats, LoggedEffect};
pub use mutex::{AsyncMutex, AsyncMutexGuard, AsyncRefCell};
pub use pir_eval::{evaluate_pir, AsyncEvalOptions, AsyncEvaluator, Concurrency};
pub use scheduler::{DefaultScheduler, DeterministicMode, DeterministicScheduler, Scheduler, TaskFn, TaskId};
pub use store::{ChannelStore, RefCellStore};
