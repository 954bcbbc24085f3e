pub mod matching;
pub mod policy;
pub mod reconcile;
pub mod sink;
pub mod watch;

pub use policy::{plan, Action, Decision, DeleteReason, KeepReason, Plan};
pub use reconcile::{reconcile, DeletedMovie, Reconciler, RunReport, Sources};
pub use sink::{sink_for, ApplySink, DryRunSink, MutationSink};
pub use watch::resolve_watch_history;
