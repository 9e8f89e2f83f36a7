//! Periodic job (cron-driven) that notifies delegators about delegations
//! whose window has ended. Each record is marked so the notice goes out once.

use hrdesk_backend::{
    config::Config,
    db::connection::create_pool,
    models::notification::NotificationType,
    repositories::{DelegationStore, SqlDelegationStore},
    services::{NotificationSink, SqlNotificationSink},
    utils::time::today_local,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hrdesk_backend=info".into()),
        )
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    let store = SqlDelegationStore::new(pool.clone());
    let sink = SqlNotificationSink::new(pool);

    let today = today_local(&config.time_zone);
    let expired = store.find_expired_unnotified(today).await?;
    let total = expired.len();
    let mut notified = 0usize;

    for delegation in expired {
        let message = format!(
            "Your {} delegation ended on {}",
            delegation.delegation_type.db_value(),
            delegation.end_date
        );
        if let Err(err) = sink
            .enqueue(
                delegation.id,
                delegation.delegator_id,
                NotificationType::DelegationExpired,
                message,
            )
            .await
        {
            tracing::warn!(delegation_id = %delegation.id, error = %err, "expiry notice failed");
            continue;
        }
        store.mark_expiry_notified(delegation.id).await?;
        notified += 1;
    }

    if total > 0 {
        tracing::info!("Notified {} of {} expired delegations", notified, total);
    }

    Ok(())
}
