use tracing::{debug, error};

use crate::model::{CustomerStatus, CustomerStatusSource, CustomerValue};

use super::error::CustomerError;
use super::lookup::{CrmMatch, CustomerLookup};

/// Phrases by which an unmatched sender says they are already a customer.
pub const EXISTING_CUSTOMER_SIGNALS: &[&str] = &[
    "ho già un contratto",
    "cliente dal",
    "vostro cliente",
    "mio account",
    "precedente ordine",
    "sono già cliente",
];

/// Maps a lookup result (and, on no match, the message text) to a status.
pub fn status_from_lookup(result: Result<CrmMatch, CustomerError>, text: &str) -> CustomerStatus {
    let (value, confidence, source) = match result {
        Ok(CrmMatch::Exact) => (
            CustomerValue::Existing,
            1.0,
            CustomerStatusSource::CrmExactMatch,
        ),
        Ok(CrmMatch::Domain) => (
            CustomerValue::Existing,
            0.7,
            CustomerStatusSource::CrmDomainMatch,
        ),
        Ok(CrmMatch::None) => {
            let lower = text.to_lowercase();
            if EXISTING_CUSTOMER_SIGNALS.iter().any(|s| lower.contains(s)) {
                (
                    CustomerValue::Existing,
                    0.5,
                    CustomerStatusSource::TextSignal,
                )
            } else {
                (
                    CustomerValue::New,
                    0.8,
                    CustomerStatusSource::NoCrmNoSignal,
                )
            }
        }
        Err(e) => {
            error!(error = %e, "Customer lookup failed");
            (
                CustomerValue::Unknown,
                0.2,
                CustomerStatusSource::LookupFailed,
            )
        }
    };

    CustomerStatus {
        value,
        confidence,
        source,
    }
}

pub async fn compute_customer_status<L: CustomerLookup>(
    lookup: &L,
    from_address: &str,
    text: &str,
) -> CustomerStatus {
    let status = status_from_lookup(lookup.lookup(from_address).await, text);
    debug!(
        value = ?status.value,
        source = ?status.source,
        "Customer status computed"
    );
    status
}
