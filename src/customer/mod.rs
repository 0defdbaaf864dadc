//! Customer status derived from an injected CRM lookup plus text signals.
//!
//! A lookup failure never fails the message; it yields status `unknown` with low confidence.

pub mod error;
pub mod lookup;
pub mod status;


pub use error::CustomerError;
#[cfg(any(test, feature = "mock"))]
pub use lookup::MockCustomerLookup;
pub use lookup::{CrmMatch, CustomerLookup, NoCustomerLookup};
pub use status::{EXISTING_CUSTOMER_SIGNALS, compute_customer_status, status_from_lookup};
