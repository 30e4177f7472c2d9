//! Domain models for the tutoring back-office.

mod appointment;
mod customer;
mod invoice;
mod tutor;

pub use appointment::{Appointment, AppointmentStatus, CreateAppointment, UpdateAppointment};
pub use customer::{CreateCustomer, Customer};
pub use invoice::{CreateInvoice, Invoice, ListInvoicesFilter, UpdateInvoice};
pub use tutor::{
    default_share_percentage, validate_share_percentage, CreateTutor, Tutor, TutorLedger,
    UpdateTutor,
};
