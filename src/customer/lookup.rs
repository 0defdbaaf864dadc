use serde::{Deserialize, Serialize};

use super::error::CustomerError;

/// How the sender address matched the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrmMatch {
    /// The full address is a known customer.
    Exact,
    /// Only the domain is known.
    Domain,
    None,
}

/// External CRM boundary.
pub trait CustomerLookup: Send + Sync {
    fn lookup(
        &self,
        from_address: &str,
    ) -> impl std::future::Future<Output = Result<CrmMatch, CustomerError>> + Send;
}

/// Lookup used when no CRM is wired in. Every sender is unmatched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomerLookup;

impl CustomerLookup for NoCustomerLookup {
    async fn lookup(&self, _from_address: &str) -> Result<CrmMatch, CustomerError> {
        Ok(CrmMatch::None)
    }
}

/// In-memory CRM keyed by address and by domain.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, Default)]
pub struct MockCustomerLookup {
    addresses: std::collections::HashSet<String>,
    domains: std::collections::HashSet<String>,
    fail: bool,
}

#[cfg(any(test, feature = "mock"))]
impl MockCustomerLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.addresses.insert(address.to_lowercase());
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domains.insert(domain.to_lowercase());
        self
    }

    /// Every lookup fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[cfg(any(test, feature = "mock"))]
impl CustomerLookup for MockCustomerLookup {
    async fn lookup(&self, from_address: &str) -> Result<CrmMatch, CustomerError> {
        if self.fail {
            return Err(CustomerError::LookupFailed {
                reason: "mock CRM unavailable".to_string(),
            });
        }

        let address = from_address.trim().to_lowercase();
        if self.addresses.contains(&address) {
            return Ok(CrmMatch::Exact);
        }
        let domain = address.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
        if self.domains.contains(domain) {
            return Ok(CrmMatch::Domain);
        }
        Ok(CrmMatch::None)
    }
}
