use anyhow::Context;
use rusqlite::TransactionBehavior;

use crate::db::{queries, Store};
use crate::errors::AppError;
use crate::models::{Service, ServiceInput, ServiceName, Upsert};

/// Creates the named service, or sets the rate of the existing one.
///
/// Keyed on the service name, so repeated calls converge on one record
/// carrying the latest rate.
pub fn upsert_service(store: &Store, input: ServiceInput) -> Result<(Service, Upsert), AppError> {
    let (Some(raw_name), Some(hourly_rate)) = (
        input.service_name.filter(|n| !n.trim().is_empty()),
        input.hourly_rate,
    ) else {
        return Err(AppError::InvalidInput(
            "Service name and hourly rate are required.".to_string(),
        ));
    };

    let name = ServiceName::parse(&raw_name).ok_or_else(|| {
        AppError::InvalidInput(format!("{} is not a supported service.", raw_name.trim()))
    })?;

    if !hourly_rate.is_finite() || hourly_rate < 0.0 {
        return Err(AppError::InvalidInput(
            "Hourly rate must be a non-negative number.".to_string(),
        ));
    }

    store.with_conn(|conn| -> Result<_, AppError> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin service transaction")?;
        let now = queries::now();

        let outcome = match queries::find_service_by_name(&tx, name)? {
            Some(mut service) => {
                queries::update_service_rate(&tx, &service.id, hourly_rate, &now)?;
                service.hourly_rate = hourly_rate;
                service.updated_at = now;
                (service, Upsert::Updated)
            }
            None => {
                let service = Service {
                    id: uuid::Uuid::new_v4().to_string(),
                    service_name: name,
                    hourly_rate,
                    created_at: now,
                    updated_at: now,
                };
                queries::insert_service(&tx, &service)?;
                (service, Upsert::Created)
            }
        };

        tx.commit().context("failed to commit service")?;

        tracing::info!(
            service_id = %outcome.0.id,
            service = name.as_str(),
            hourly_rate,
            outcome = ?outcome.1,
            "service saved"
        );
        Ok(outcome)
    })
}

pub fn list_services(store: &Store) -> Result<Vec<Service>, AppError> {
    store.with_conn(|conn| Ok(queries::list_services(conn)?))
}
