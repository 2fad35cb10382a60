//! Transaction Assembler
//!
//! Builds an ordered [`TxDraft`] from resolved funding inputs and requested
//! destinations. Amounts are converted to subunits here (floor rounding);
//! whether the inputs actually cover the outputs is left to the build step,
//! which fails on insufficiency.

use super::types::{Destination, DraftOutput, FundingInput, TxDraft};
use crate::money::{self, MoneyError};

pub fn assemble(
    inputs: Vec<FundingInput>,
    destinations: &[Destination],
) -> Result<TxDraft, MoneyError> {
    let mut outputs = Vec::with_capacity(destinations.len());
    for dest in destinations {
        outputs.push(DraftOutput {
            address: dest.address.clone(),
            value: money::output_subunits(dest.amount)?,
        });
    }
    Ok(TxDraft { inputs, outputs })
}
