use std::collections::{BTreeSet, HashMap};

use rusqlite::Connection;

use crate::db::queries;

/// Fetches the current hourly rate of each requested service in one query.
///
/// Ids unknown to the store are left out of the map; callers decide what a
/// missing rate means.
pub fn resolve_rates(
    conn: &Connection,
    service_ids: &BTreeSet<&str>,
) -> anyhow::Result<HashMap<String, f64>> {
    let ids: Vec<&str> = service_ids.iter().copied().collect();
    let services = queries::get_services_by_ids(conn, &ids)?;

    Ok(services
        .into_iter()
        .map(|s| (s.id, s.hourly_rate))
        .collect())
}
