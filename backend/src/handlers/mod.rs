pub mod delegations;
pub mod notifications;
pub mod requests;
