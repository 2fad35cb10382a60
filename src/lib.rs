//! chain_gateway - Transaction Construction & Broadcast Gateway
//!
//! An HTTP middleware that builds, signs, and broadcasts funds-transfer
//! transactions against two ledger types:
//!
//! - [`utxo`] - UTXO-chain pipeline: funding resolution, assembly, signing
//! - [`withdrawal`] - account-chain broadcast saga with compensation
//! - [`upstream`] - collaborator interfaces (history, UTXO check, ledger, broadcast)
//! - [`money`] - decimal-to-subunit conversion
//! - [`gateway`] - axum HTTP surface
//!
//! Key derivation and network transport live outside this crate; all remote
//! effects go through the [`upstream::CoreApi`] seam.

pub mod config;
pub mod logging;
pub mod money;

pub mod gateway;
pub mod upstream;
pub mod utxo;
pub mod withdrawal;

// Convenient re-exports at crate root
pub use config::{AppConfig, Network};
pub use money::{MoneyError, to_subunits};
pub use upstream::{CoreApi, HttpCoreClient, UpstreamError};
pub use utxo::{FundingInput, FundingSourceResolver, OutpointRef, TxDraft};
pub use withdrawal::{SagaState, WithdrawalSaga};
