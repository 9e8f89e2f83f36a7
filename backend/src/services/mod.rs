pub mod delegation;
pub mod directory;
pub mod ledger;
pub mod notifier;
pub mod resolver;
pub mod workflow;

pub use delegation::DelegationService;
pub use directory::{EmployeeDirectory, SqlEmployeeDirectory};
pub use ledger::{BalanceLedger, LedgerError, SqlBalanceLedger};
pub use notifier::{NotificationSink, SinkError, SqlNotificationSink};
pub use resolver::{ApprovalMode, ApprovalResolver, ApprovalRights};
pub use workflow::{EngineConfig, WorkflowEngine};
