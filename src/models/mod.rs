mod payment;

pub use payment::{CreatePayment, Payment, PaymentStatus};
