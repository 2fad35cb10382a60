//! Account-chain withdrawal flow: saga orchestration, payment envelope
//! signing, and the state machine behind them.

pub mod payment;
pub mod saga;
pub mod state;

pub use payment::{Asset, Memo, PaymentError};
pub use saga::{SagaError, TransferCommand, WithdrawalSaga, NATIVE_ASSET};
pub use state::SagaState;
