pub mod session;
pub mod workflow;

pub use session::PlannerSession;
pub use workflow::{PlannerWorkflow, WorkflowState};
