//! The Click callback protocol: wire types, signature verification, and the
//! PREPARE/COMPLETE validation state machines.
//!
//! The gateway dictates this contract exactly - field order in the digest,
//! numeric error codes, and the always-HTTP-200 response shape. Any deviation
//! silently breaks every callback.

pub mod request;
pub mod response;
pub mod sign;
pub mod validator;

pub use request::{parse_amount, CallbackAction, CallbackRequest};
pub use response::{CallbackResponse, ProtocolError};
