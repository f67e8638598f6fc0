//! Structured run logging.
//!
//! Every line logged through a [`RunLogger`] carries the run id and the
//! workflow, so interleaved output from parallel clip work stays attributable.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use playclip_models::Workflow;

/// Logger bound to one pipeline run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    workflow: String,
}

impl RunLogger {
    /// New logger with a fresh run id.
    pub fn new(workflow: Workflow) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            workflow: workflow.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            workflow = %self.workflow,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            workflow = %self.workflow,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            workflow = %self.workflow,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            workflow = %self.workflow,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            workflow = %self.workflow,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// Span carrying the run id, for instrumenting per-clip futures.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            workflow = %self.workflow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        let a = RunLogger::new(Workflow::Split);
        let b = RunLogger::new(Workflow::Split);
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.workflow(), "split");
        assert!(Uuid::parse_str(a.run_id()).is_ok());
    }
}
