use anyhow::Context;
use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::models::{
    Booking, BookingStatus, Customer, CustomerRef, LineItem, Service, ServiceName,
};

pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Current UTC time at the precision the store keeps.
pub fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .with_context(|| format!("malformed timestamp in store: {s}"))
}

/// True if `err` came from a UNIQUE constraint (including unique indexes).
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ── Customers ──

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, address, created_at, updated_at";

pub fn insert_customer(conn: &Connection, customer: &Customer) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO customers (id, first_name, last_name, email, phone, address, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            customer.id,
            customer.first_name,
            customer.last_name,
            customer.email,
            customer.phone,
            customer.address,
            fmt_ts(&customer.created_at),
            fmt_ts(&customer.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_customer(conn: &Connection, id: &str) -> anyhow::Result<Option<Customer>> {
    let row = conn
        .query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
            params![id],
            |row| Ok(parse_customer_row(row)),
        )
        .optional()?;

    row.transpose()
}

pub fn list_customers(conn: &Connection) -> anyhow::Result<Vec<Customer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC, last_name ASC"
    ))?;
    let rows = stmt.query_map([], |row| Ok(parse_customer_row(row)))?;

    let mut customers = vec![];
    for row in rows {
        customers.push(row??);
    }
    Ok(customers)
}

#[cfg(test)]
pub fn count_customers_with_email(conn: &Connection, email: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM customers WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_customer_row(row: &rusqlite::Row) -> anyhow::Result<Customer> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Customer {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Services ──

const SERVICE_COLUMNS: &str = "id, service_name, hourly_rate, created_at, updated_at";

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, service_name, hourly_rate, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            service.id,
            service.service_name.as_str(),
            service.hourly_rate,
            fmt_ts(&service.created_at),
            fmt_ts(&service.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_service_rate(
    conn: &Connection,
    id: &str,
    hourly_rate: f64,
    updated_at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET hourly_rate = ?1, updated_at = ?2 WHERE id = ?3",
        params![hourly_rate, fmt_ts(updated_at), id],
    )?;
    Ok(count > 0)
}

pub fn find_service_by_name(
    conn: &Connection,
    name: ServiceName,
) -> anyhow::Result<Option<Service>> {
    let row = conn
        .query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE service_name = ?1"),
            params![name.as_str()],
            |row| Ok(parse_service_row(row)),
        )
        .optional()?;

    row.transpose()
}

/// Batch fetch; ids with no matching row are simply absent from the result.
pub fn get_services_by_ids(conn: &Connection, ids: &[&str]) -> anyhow::Result<Vec<Service>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id IN ({placeholders})"
    ))?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
        Ok(parse_service_row(row))
    })?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services ORDER BY service_name ASC"
    ))?;
    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

#[cfg(test)]
pub fn count_services_named(conn: &Connection, name: ServiceName) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM services WHERE service_name = ?1",
        params![name.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let name_str: String = row.get(1)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(Service {
        id: row.get(0)?,
        service_name: ServiceName::parse(&name_str)
            .with_context(|| format!("unknown service name in store: {name_str}"))?,
        hourly_rate: row.get(2)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, client_id, booking_date, services, total_amount, status, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let services_json = serde_json::to_string(&booking.services)?;

    conn.execute(
        "INSERT INTO bookings (id, client_id, booking_date, booking_day, services, total_amount, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id,
            booking.client.0,
            fmt_ts(&booking.booking_date),
            booking.day().format(DAY_FORMAT).to_string(),
            services_json,
            booking.total_amount,
            booking.status.as_str(),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Whether any booking that isn't cancelled falls within `[start, end]`.
pub fn live_booking_exists_in_range(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM bookings
             WHERE booking_date >= ?1 AND booking_date <= ?2 AND status != 'Cancelled'
         )",
        params![fmt_ts(start), fmt_ts(end)],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let row = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    row.transpose()
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<&str>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 ORDER BY booking_date ASC"
            ),
            vec![status.as_str()],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY booking_date ASC"),
            vec![],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params_vec), |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

#[cfg(test)]
pub fn count_bookings(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    updated_at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(updated_at), id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let booking_date: String = row.get(2)?;
    let services_json: String = row.get(3)?;
    let status_str: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    let services: Vec<LineItem> = serde_json::from_str(&services_json)
        .context("malformed line items in store")?;

    Ok(Booking {
        id: row.get(0)?,
        client: CustomerRef(row.get(1)?),
        booking_date: parse_ts(&booking_date)?,
        services,
        total_amount: row.get(4)?,
        status: BookingStatus::parse(&status_str)
            .with_context(|| format!("unknown booking status in store: {status_str}"))?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}
