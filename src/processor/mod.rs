pub mod reconciler;
pub mod run;

#[cfg(test)]
pub mod testing;

pub use reconciler::{Reconciler, RunSummary};
pub use run::run_once;
