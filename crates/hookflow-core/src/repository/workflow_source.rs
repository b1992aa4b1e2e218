//! Workflow source trait definition.
//!
//! Workflow definitions are persisted outside the engine. At startup the
//! engine pulls every stored record from a `WorkflowSource` and registers
//! the enabled ones.

use hookflow_types::error::RepositoryError;
use hookflow_types::workflow::Workflow;

pub trait WorkflowSource: Send + Sync {
    /// Every stored workflow, enabled or not, in a stable order.
    fn load_workflows(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Workflow>, RepositoryError>> + Send;
}
