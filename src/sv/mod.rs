pub mod lead;
pub mod ledger;
pub mod message;
pub mod partner;
pub mod payment;
pub mod reward;
pub mod stats;
#[cfg(test)]
pub mod test_utils;
pub mod window;

pub use lead::Lead;
pub use ledger::Ledger;
pub use message::Message;
pub use partner::Partner;
pub use payment::Payment;
pub use stats::Stats;
