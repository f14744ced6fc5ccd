pub mod announcement_read;
pub mod commission;
pub mod lead;
pub mod message;
pub mod partner;
pub mod payment;

pub use commission::{CommissionKind, CommissionStatus};
pub use lead::LeadStatus;
pub use message::{MessageType, SenderType};
pub use partner::UserType;
pub use payment::PaymentStatus;
