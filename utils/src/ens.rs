//! ENS forward resolution: registry lookup of the resolver, then `addr(node)`.

use alloy::{
    primitives::{address, keccak256, Address, B256},
    providers::Provider,
    sol,
};

pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    #[sol(rpc)]
    interface EnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    interface EnsResolver {
        function addr(bytes32 node) external view returns (address);
    }
}

/// EIP-137 namehash of a lowercased name.
pub fn namehash(name: &str) -> B256 {
    let name = name.to_lowercase();
    let mut node = B256::ZERO;
    for label in name.rsplit('.').filter(|label| !label.is_empty()) {
        let mut preimage = [0u8; 64];
        preimage[..32].copy_from_slice(node.as_slice());
        preimage[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(preimage);
    }
    node
}

/// Returns `None` when no resolver is set or the resolver has no address.
pub async fn resolve<P: Provider>(provider: &P, name: &str) -> crate::Result<Option<Address>> {
    let node = namehash(name);

    let resolver = EnsRegistry::new(ENS_REGISTRY, provider)
        .resolver(node)
        .call()
        .await
        .map_err(|error| crate::Error::EnsCall(error.to_string()))?;

    if resolver.is_zero() {
        return Ok(None);
    }

    let address = EnsResolver::new(resolver, provider)
        .addr(node)
        .call()
        .await
        .map_err(|error| crate::Error::EnsCall(error.to_string()))?;

    Ok((!address.is_zero()).then_some(address))
}
