//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::db::connection::DbPool;
use crate::repositories::{SqlDelegationStore, SqlRequestStore};
use crate::services::{
    DelegationService, EngineConfig, SqlBalanceLedger, SqlEmployeeDirectory, SqlNotificationSink,
    WorkflowEngine,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub workflow: WorkflowEngine,
    pub delegations: DelegationService,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let delegation_store = Arc::new(SqlDelegationStore::new(pool.clone()));
        let directory = Arc::new(SqlEmployeeDirectory::new(pool.clone()));

        let workflow = WorkflowEngine::new(
            Arc::new(SqlRequestStore::new(pool.clone())),
            delegation_store.clone(),
            directory.clone(),
            Arc::new(SqlBalanceLedger::new(pool.clone())),
            EngineConfig::from_config(&config),
        );
        let delegations = DelegationService::new(
            delegation_store,
            directory,
            Arc::new(SqlNotificationSink::new(pool.clone())),
            config.time_zone,
        );

        Self {
            pool,
            config,
            workflow,
            delegations,
        }
    }
}
