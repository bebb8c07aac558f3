pub mod amount;
pub mod message;
pub mod transaction;

pub use amount::{AmountParseError, CurrencyAmount, DROPS_PER_NATIVE, NATIVE_SYMBOL};
pub use message::{InboundFrame, SubscribeCommand};
pub use transaction::{
    ledger_time_to_utc, utc_to_ledger_time, TransactionEvent, TransactionKind, LEDGER_EPOCH_OFFSET,
};
