use crate::db::{queries, Store};
use crate::errors::AppError;
use crate::models::customer::normalize_email;
use crate::models::{Customer, CustomerInput};

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn register_customer(store: &Store, input: CustomerInput) -> Result<Customer, AppError> {
    let first_name = present(input.first_name);
    let last_name = present(input.last_name);
    let email = present(input.email);
    let phone = present(input.phone);
    let address = present(input.address);

    let missing: Vec<&str> = [
        ("firstName", first_name.is_none()),
        ("lastName", last_name.is_none()),
        ("email", email.is_none()),
        ("phone", phone.is_none()),
        ("address", address.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(first_name), Some(last_name), Some(email), Some(phone), Some(address)) =
        (first_name, last_name, email, phone, address)
    else {
        return Err(AppError::InvalidInput(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    let email = normalize_email(&email)
        .ok_or_else(|| AppError::InvalidInput("Please enter a valid email.".to_string()))?;

    let now = queries::now();
    let customer = Customer {
        id: uuid::Uuid::new_v4().to_string(),
        first_name,
        last_name,
        email,
        phone,
        address,
        created_at: now,
        updated_at: now,
    };

    store.with_conn(|conn| match queries::insert_customer(conn, &customer) {
        Ok(()) => Ok(()),
        Err(e) if queries::is_unique_violation(&e) => {
            Err(AppError::DuplicateEmail(customer.email.clone()))
        }
        Err(e) => Err(e.into()),
    })?;

    tracing::info!(customer_id = %customer.id, "customer registered");
    Ok(customer)
}

pub fn list_customers(store: &Store) -> Result<Vec<Customer>, AppError> {
    store.with_conn(|conn| Ok(queries::list_customers(conn)?))
}
