pub mod booking;
pub mod customer;
pub mod service;

pub use booking::{
    Booking, BookingInput, BookingStatus, CustomerRef, LineItem, LineItemInput, ResolvedBooking,
    ResolvedLineItem, ServiceRef, StatusInput,
};
pub use customer::{Customer, CustomerInput};
pub use service::{Service, ServiceInput, ServiceName, Upsert};
