pub mod certificate;
pub mod digest;
pub mod outcome;
pub mod submission;

pub use certificate::{Certificate, Claimant};
pub use digest::{Digest, DIGEST_LEN};
pub use outcome::{QueryOutcome, Rejection, SubmitOutcome, TransportError, TransportFault};
pub use submission::{Authorization, TxHandle};
