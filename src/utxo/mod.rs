//! UTXO transfer pipeline: resolve funding sources, assemble a draft,
//! sign it in-process.

pub mod assembler;
pub mod resolver;
pub mod signer;
pub mod types;

pub use assembler::assemble;
pub use resolver::{AddressSource, FundingSourceResolver, ResolveError, UtxoSource, MIN_CONFIRMATIONS};
pub use signer::{sign, SignError};
pub use types::{Destination, DraftOutput, FundingInput, OutpointRef, SigningKey, TxDraft};
