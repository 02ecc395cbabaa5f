use std::collections::{BTreeSet, HashMap};

use anyhow::Context;
use chrono::{NaiveDateTime, Timelike};
use rusqlite::TransactionBehavior;

use crate::db::{queries, Store};
use crate::errors::AppError;
use crate::models::booking::{parse_booking_date, MIN_HOURS};
use crate::models::{
    Booking, BookingInput, BookingStatus, CustomerRef, LineItem, ResolvedBooking,
    ResolvedLineItem, ServiceRef, StatusInput,
};
use crate::services::{rates, scheduling};

const MISSING_FIELDS: &str = "Client, booking date, and at least one service are required.";

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub client: CustomerRef,
    pub booking_date: NaiveDateTime,
    pub services: Vec<LineItem>,
}

impl TryFrom<BookingInput> for NewBooking {
    type Error = AppError;

    fn try_from(input: BookingInput) -> Result<Self, Self::Error> {
        let client = input
            .client
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let raw_date = input.booking_date.filter(|d| !d.trim().is_empty());
        let items = input.services.filter(|s| !s.is_empty());

        let (Some(client), Some(raw_date), Some(items)) = (client, raw_date, items) else {
            return Err(AppError::InvalidInput(MISSING_FIELDS.to_string()));
        };

        let booking_date = parse_booking_date(&raw_date).ok_or_else(|| {
            AppError::InvalidInput(format!("bookingDate is not a valid date: {raw_date}"))
        })?;
        // the store keeps whole seconds
        let booking_date = booking_date.with_nanosecond(0).unwrap_or(booking_date);

        let mut services = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let service_id = item
                .service_id
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    AppError::InvalidInput(format!("services[{idx}].serviceId is required."))
                })?;

            let hours = item.number_of_hours.ok_or_else(|| {
                AppError::InvalidInput(format!("services[{idx}].numberOfHours is required."))
            })?;
            if !hours.is_finite() || hours < MIN_HOURS {
                return Err(AppError::InvalidInput(format!(
                    "services[{idx}]: a minimum of half an hour is required."
                )));
            }

            services.push(LineItem {
                service_id: ServiceRef(service_id),
                number_of_hours: hours,
            });
        }

        Ok(NewBooking {
            client: CustomerRef(client),
            booking_date,
            services,
        })
    }
}

/// Sums `rate * hours` over the line items. Any item whose service has no
/// rate fails the whole computation, as does a total too large to represent.
pub fn compute_total(items: &[LineItem], rates: &HashMap<String, f64>) -> Result<f64, AppError> {
    let mut total = 0.0;
    for item in items {
        let rate = rates
            .get(&item.service_id.0)
            .ok_or_else(|| AppError::ServiceNotFound(item.service_id.0.clone()))?;
        total += rate * item.number_of_hours;
    }
    if !total.is_finite() {
        return Err(AppError::InvalidInput(
            "Booking total is too large to be priced.".to_string(),
        ));
    }
    Ok(total)
}

/// Validates, checks the day is free, prices and stores a booking.
///
/// Every check runs before the single insert, and all of it runs inside one
/// immediate transaction so a concurrent writer can't claim the day between
/// the conflict check and the insert.
pub fn create_booking(store: &Store, input: BookingInput) -> Result<Booking, AppError> {
    let request = NewBooking::try_from(input)?;
    let day = request.booking_date.date();

    store.with_conn(|conn| -> Result<_, AppError> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin booking transaction")?;

        if scheduling::has_conflict(&tx, day)? {
            tracing::info!(date = %day, "booking rejected: day already taken");
            return Err(AppError::ScheduleConflict { date: day });
        }

        if queries::get_customer(&tx, &request.client.0)?.is_none() {
            return Err(AppError::CustomerNotFound(request.client.0.clone()));
        }

        let ids: BTreeSet<&str> = request
            .services
            .iter()
            .map(|item| item.service_id.0.as_str())
            .collect();
        let rates = rates::resolve_rates(&tx, &ids)?;
        let total_amount = compute_total(&request.services, &rates)?;

        let now = queries::now();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            client: request.client,
            booking_date: request.booking_date,
            services: request.services,
            total_amount,
            status: BookingStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = queries::insert_booking(&tx, &booking) {
            if queries::is_unique_violation(&e) {
                return Err(AppError::ScheduleConflict { date: day });
            }
            return Err(e.into());
        }
        tx.commit().context("failed to commit booking")?;

        tracing::info!(
            booking_id = %booking.id,
            client = %booking.client.0,
            date = %day,
            total = booking.total_amount,
            "booking created"
        );
        Ok(booking)
    })
}

pub fn list_bookings(store: &Store, status: Option<&str>) -> Result<Vec<Booking>, AppError> {
    let status = status
        .map(|s| {
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("unknown booking status: {s}")))
        })
        .transpose()?;

    store.with_conn(|conn| Ok(queries::list_bookings(conn, status)?))
}

/// Loads a booking with its customer and service records attached.
pub fn get_resolved_booking(store: &Store, id: &str) -> Result<ResolvedBooking, AppError> {
    store.with_conn(|conn| -> Result<_, AppError> {
        let booking = queries::get_booking(conn, id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

        let client = queries::get_customer(conn, &booking.client.0)?.ok_or_else(|| {
            anyhow::anyhow!(
                "booking {id} references missing customer {}",
                booking.client.0
            )
        })?;

        let ids: Vec<&str> = booking
            .services
            .iter()
            .map(|item| item.service_id.0.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let by_id: HashMap<String, _> = queries::get_services_by_ids(conn, &ids)?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        let services = booking
            .services
            .iter()
            .map(|item| ResolvedLineItem {
                service_id: item.service_id.clone(),
                service: by_id.get(&item.service_id.0).cloned(),
                number_of_hours: item.number_of_hours,
            })
            .collect();

        Ok(ResolvedBooking {
            id: booking.id,
            client,
            booking_date: booking.booking_date,
            services,
            total_amount: booking.total_amount,
            status: booking.status,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        })
    })
}

/// Moves a scheduled booking to `Completed` or `Cancelled`.
pub fn update_status(store: &Store, id: &str, input: StatusInput) -> Result<Booking, AppError> {
    let raw = input
        .status
        .ok_or_else(|| AppError::InvalidInput("status is required.".to_string()))?;
    let next = BookingStatus::parse(raw.trim())
        .ok_or_else(|| AppError::InvalidInput(format!("unknown booking status: {raw}")))?;

    store.with_conn(|conn| -> Result<_, AppError> {
        let mut booking = queries::get_booking(conn, id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

        if !booking.status.can_transition_to(next) {
            return Err(AppError::InvalidInput(format!(
                "cannot move a {} booking to {}",
                booking.status.as_str(),
                next.as_str()
            )));
        }

        let now = queries::now();
        queries::update_booking_status(conn, id, next, &now)?;
        booking.status = next;
        booking.updated_at = now;

        tracing::info!(booking_id = %id, status = next.as_str(), "booking status updated");
        Ok(booking)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerInput, LineItemInput, ServiceInput};
    use crate::services::{catalog, customers};

    fn setup() -> (Store, String, String, String) {
        let store = Store::new(":memory:");
        let customer = customers::register_customer(
            &store,
            CustomerInput {
                first_name: Some("Ada".to_string()),
                last_name: Some("Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                phone: Some("+15550001111".to_string()),
                address: Some("1 Main St".to_string()),
            },
        )
        .unwrap();
        let (svc_a, _) = catalog::upsert_service(
            &store,
            ServiceInput {
                service_name: Some("Plumbing".to_string()),
                hourly_rate: Some(100.0),
            },
        )
        .unwrap();
        let (svc_b, _) = catalog::upsert_service(
            &store,
            ServiceInput {
                service_name: Some("Electrical".to_string()),
                hourly_rate: Some(50.0),
            },
        )
        .unwrap();
        (store, customer.id, svc_a.id, svc_b.id)
    }

    fn item(id: &str, hours: f64) -> LineItemInput {
        LineItemInput {
            service_id: Some(id.to_string()),
            number_of_hours: Some(hours),
        }
    }

    fn input(client: &str, date: &str, items: Vec<LineItemInput>) -> BookingInput {
        BookingInput {
            client: Some(client.to_string()),
            booking_date: Some(date.to_string()),
            services: Some(items),
        }
    }

    fn booking_count(store: &Store) -> i64 {
        store
            .with_conn(|conn| queries::count_bookings(conn))
            .unwrap()
    }

    #[test]
    fn test_create_booking_computes_total() {
        let (store, client, svc_a, svc_b) = setup();

        let booking = create_booking(
            &store,
            input(&client, "2024-06-01", vec![item(&svc_a, 2.0), item(&svc_b, 1.0)]),
        )
        .unwrap();

        assert_eq!(booking.total_amount, 250.0);
        assert_eq!(booking.status, BookingStatus::Scheduled);
        assert_eq!(booking.services.len(), 2);
        assert_eq!(booking.services[0].service_id.0, svc_a);

        let stored = store
            .with_conn(|conn| queries::get_booking(conn, &booking.id))
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_amount, 250.0);
        assert_eq!(stored.client.0, client);
    }

    #[test]
    fn test_total_keeps_fractional_precision() {
        let rates = HashMap::from([("a".to_string(), 33.33), ("b".to_string(), 10.0)]);
        let items = vec![
            LineItem {
                service_id: ServiceRef("a".to_string()),
                number_of_hours: 1.5,
            },
            LineItem {
                service_id: ServiceRef("b".to_string()),
                number_of_hours: 0.5,
            },
        ];
        let total = compute_total(&items, &rates).unwrap();
        assert_eq!(total, 33.33 * 1.5 + 10.0 * 0.5);
    }

    #[test]
    fn test_overflowing_total_creates_nothing() {
        let (store, client, svc_a, _) = setup();
        let (huge, _) = catalog::upsert_service(
            &store,
            ServiceInput {
                service_name: Some("Masonry".to_string()),
                hourly_rate: Some(1e308),
            },
        )
        .unwrap();

        let err = create_booking(&store, input(&client, "2024-06-01", vec![item(&huge.id, 10.0)]))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");
        assert_eq!(booking_count(&store), 0);

        // the day stays free
        let booking =
            create_booking(&store, input(&client, "2024-06-01", vec![item(&svc_a, 1.0)])).unwrap();
        assert_eq!(booking.total_amount, 100.0);
    }

    #[test]
    fn test_same_service_twice_counts_twice() {
        let (store, client, svc_a, _) = setup();
        let booking = create_booking(
            &store,
            input(&client, "2024-06-01", vec![item(&svc_a, 1.0), item(&svc_a, 0.5)]),
        )
        .unwrap();
        assert_eq!(booking.total_amount, 150.0);
    }

    #[test]
    fn test_unknown_service_creates_nothing() {
        let (store, client, svc_a, _) = setup();

        let err = create_booking(
            &store,
            input(&client, "2024-06-01", vec![item(&svc_a, 1.0), item("nope", 1.0)]),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::ServiceNotFound(ref id) if id == "nope"));
        assert_eq!(booking_count(&store), 0);
    }

    #[test]
    fn test_second_booking_same_day_conflicts() {
        let (store, client, svc_a, _) = setup();
        create_booking(&store, input(&client, "2024-06-01T09:00", vec![item(&svc_a, 1.0)]))
            .unwrap();

        let err = create_booking(
            &store,
            input(&client, "2024-06-01T16:00", vec![item(&svc_a, 1.0)]),
        )
        .unwrap_err();

        match err {
            AppError::ScheduleConflict { date } => {
                assert_eq!(date.to_string(), "2024-06-01")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(booking_count(&store), 1);

        // the next day is free
        create_booking(&store, input(&client, "2024-06-02", vec![item(&svc_a, 1.0)]))
            .unwrap();
    }

    #[test]
    fn test_cancelled_booking_frees_the_day() {
        let (store, client, svc_a, _) = setup();
        let first =
            create_booking(&store, input(&client, "2024-06-01", vec![item(&svc_a, 1.0)]))
                .unwrap();

        update_status(
            &store,
            &first.id,
            StatusInput {
                status: Some("Cancelled".to_string()),
            },
        )
        .unwrap();

        let second =
            create_booking(&store, input(&client, "2024-06-01", vec![item(&svc_a, 3.0)]))
                .unwrap();
        assert_eq!(second.total_amount, 300.0);
    }

    #[test]
    fn test_total_is_frozen_after_rate_change() {
        let (store, client, svc_a, _) = setup();
        let booking =
            create_booking(&store, input(&client, "2024-06-01", vec![item(&svc_a, 2.0)]))
                .unwrap();

        catalog::upsert_service(
            &store,
            ServiceInput {
                service_name: Some("Plumbing".to_string()),
                hourly_rate: Some(500.0),
            },
        )
        .unwrap();

        let resolved = get_resolved_booking(&store, &booking.id).unwrap();
        assert_eq!(resolved.total_amount, 200.0);
        assert_eq!(
            resolved.services[0].service.as_ref().map(|s| s.hourly_rate),
            Some(500.0)
        );
    }

    #[test]
    fn test_missing_fields_are_invalid_input() {
        let (store, client, svc_a, _) = setup();

        let cases = vec![
            BookingInput {
                client: None,
                ..input(&client, "2024-06-01", vec![item(&svc_a, 1.0)])
            },
            BookingInput {
                booking_date: None,
                ..input(&client, "2024-06-01", vec![item(&svc_a, 1.0)])
            },
            BookingInput {
                services: None,
                ..input(&client, "2024-06-01", vec![])
            },
            input(&client, "2024-06-01", vec![]),
            input("   ", "2024-06-01", vec![item(&svc_a, 1.0)]),
            input(&client, "not a date", vec![item(&svc_a, 1.0)]),
            input(&client, "2024-06-01", vec![item(&svc_a, 0.25)]),
            input(
                &client,
                "2024-06-01",
                vec![LineItemInput {
                    service_id: Some(svc_a.clone()),
                    number_of_hours: None,
                }],
            ),
        ];

        for case in cases {
            let err = create_booking(&store, case).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");
        }
        assert_eq!(booking_count(&store), 0);
    }

    #[test]
    fn test_half_hour_is_accepted() {
        let (store, client, _, svc_b) = setup();
        let booking =
            create_booking(&store, input(&client, "2024-06-01", vec![item(&svc_b, 0.5)]))
                .unwrap();
        assert_eq!(booking.total_amount, 25.0);
    }

    #[test]
    fn test_unknown_client_creates_nothing() {
        let (store, _, svc_a, _) = setup();
        let err = create_booking(&store, input("ghost", "2024-06-01", vec![item(&svc_a, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, AppError::CustomerNotFound(_)));
        assert_eq!(booking_count(&store), 0);
    }

    #[test]
    fn test_status_transitions_are_checked() {
        let (store, client, svc_a, _) = setup();
        let booking =
            create_booking(&store, input(&client, "2024-06-01", vec![item(&svc_a, 1.0)]))
                .unwrap();

        let done = update_status(
            &store,
            &booking.id,
            StatusInput {
                status: Some("Completed".to_string()),
            },
        )
        .unwrap();
        assert_eq!(done.status, BookingStatus::Completed);

        let err = update_status(
            &store,
            &booking.id,
            StatusInput {
                status: Some("Cancelled".to_string()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = update_status(
            &store,
            "missing",
            StatusInput {
                status: Some("Cancelled".to_string()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_list_bookings_filters_status() {
        let (store, client, svc_a, _) = setup();
        create_booking(&store, input(&client, "2024-06-01", vec![item(&svc_a, 1.0)])).unwrap();

        assert_eq!(list_bookings(&store, None).unwrap().len(), 1);
        assert_eq!(list_bookings(&store, Some("Scheduled")).unwrap().len(), 1);
        assert!(list_bookings(&store, Some("Cancelled")).unwrap().is_empty());
        assert!(matches!(
            list_bookings(&store, Some("bogus")),
            Err(AppError::InvalidInput(_))
        ));
    }
}
