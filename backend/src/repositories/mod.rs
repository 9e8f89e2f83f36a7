pub mod common;
pub mod delegation;
pub mod notification;
pub mod request;
pub mod transaction;

pub use delegation::{DelegationStore, SqlDelegationStore};
pub use request::{LevelActionRecord, RequestListFilters, RequestStore, SqlRequestStore};
pub use transaction::*;

#[cfg(test)]
pub use delegation::MockDelegationStore;
#[cfg(test)]
pub use request::MockRequestStore;
