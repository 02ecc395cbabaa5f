pub mod booking;
pub mod catalog;
pub mod customers;
pub mod rates;
pub mod scheduling;
