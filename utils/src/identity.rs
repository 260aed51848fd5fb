use std::sync::Arc;

use tally_common::CanonicalAddress;

use crate::traits::NameResolver;

const NAME_SUFFIXES: &[&str] = &[".eth"];

/// Whether `identity` should be looked up as an ENS name.
pub fn is_name(identity: &str) -> bool {
    let identity = identity.to_lowercase();
    NAME_SUFFIXES.iter().any(|suffix| identity.contains(suffix))
}

pub struct IdentityResolver {
    names: Arc<dyn NameResolver>,
}

impl IdentityResolver {
    pub fn new(names: Arc<dyn NameResolver>) -> Self {
        Self { names }
    }

    /// Turns an address or ENS name into a lowercase address.
    ///
    /// Input is taken verbatim; surrounding whitespace makes an address invalid.
    pub async fn resolve(&self, identity: &str) -> crate::Result<CanonicalAddress> {
        if !is_name(identity) {
            return CanonicalAddress::parse(identity)
                .map_err(|_| crate::Error::InvalidIdentity(identity.to_string()));
        }

        let address = self
            .names
            .resolve_name(identity)
            .await
            .map_err(|err| crate::Error::ResolutionFailed {
                name: identity.to_string(),
                source: Box::new(err),
            })?
            .ok_or_else(|| crate::Error::NameNotResolved(identity.to_string()))?;

        CanonicalAddress::parse(&address.to_string())
            .map_err(|_| crate::Error::InvalidIdentity(identity.to_string()))
    }
}
