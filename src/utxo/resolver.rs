//! Funding Source Resolver
//!
//! Turns either explicit outpoint references or a set of funding addresses
//! into an ordered list of [`FundingInput`]s. Address resolution scans each
//! address's history sequentially (address, then transaction, then output);
//! this nested sequential order is what makes input discovery deterministic,
//! which positional signing depends on. Do not parallelize without sorting.

use super::types::{FundingInput, OutpointRef, SigningKey};
use crate::upstream::{CoreApi, UpstreamError};
use thiserror::Error;
use tracing::debug;

/// Safety threshold: transactions with fewer confirmations contribute no
/// candidate outputs.
pub const MIN_CONFIRMATIONS: u32 = 6;

/// Explicit spendable reference supplied by the caller.
#[derive(Debug, Clone)]
pub struct UtxoSource {
    pub outpoint: OutpointRef,
    pub key: SigningKey,
}

/// Funding address whose history is scanned for spendable outputs.
#[derive(Debug, Clone)]
pub struct AddressSource {
    pub address: String,
    pub key: SigningKey,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Both or neither of the funding forms were supplied. Rejected before
    /// any upstream call is made.
    #[error("Either UTXO references or funding addresses must be present.")]
    InvalidBody,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub struct FundingSourceResolver<'a> {
    core: &'a dyn CoreApi,
}

impl<'a> FundingSourceResolver<'a> {
    pub fn new(core: &'a dyn CoreApi) -> Self {
        Self { core }
    }

    /// Resolve funding inputs from exactly one of the two source forms.
    ///
    /// An empty result is not an error here; it surfaces downstream as
    /// `NoSpendableInputs` when the signer finds nothing to sign.
    pub async fn resolve(
        &self,
        from_utxo: Option<Vec<UtxoSource>>,
        from_address: Option<Vec<AddressSource>>,
    ) -> Result<Vec<FundingInput>, ResolveError> {
        match (from_utxo, from_address) {
            (Some(_), Some(_)) | (None, None) => Err(ResolveError::InvalidBody),
            (Some(sources), None) => Ok(sources
                .into_iter()
                .map(|s| FundingInput {
                    outpoint: s.outpoint,
                    key: s.key,
                })
                .collect()),
            (None, Some(addresses)) => self.resolve_addresses(addresses).await,
        }
    }

    async fn resolve_addresses(
        &self,
        addresses: Vec<AddressSource>,
    ) -> Result<Vec<FundingInput>, ResolveError> {
        let mut inputs = Vec::new();

        for source in &addresses {
            let history = self.core.fetch_history(&source.address).await?;

            for tx in &history {
                if tx.confirmations < MIN_CONFIRMATIONS {
                    debug!(
                        hash = %tx.hash,
                        confirmations = tx.confirmations,
                        "Skipping transaction below confirmation threshold"
                    );
                    continue;
                }

                for output in tx.outputs.iter().filter(|o| o.address == source.address) {
                    match self.core.check_unspent(&tx.hash, output.index).await {
                        Ok(()) => inputs.push(FundingInput {
                            outpoint: OutpointRef {
                                source_id: tx.hash.clone(),
                                source_index: output.index,
                            },
                            key: source.key.clone(),
                        }),
                        // Spent or unavailable: not a fault, just ineligible.
                        Err(UpstreamError::NotFound) => {
                            debug!(hash = %tx.hash, index = output.index, "Output already spent");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Ok(inputs)
    }
}
