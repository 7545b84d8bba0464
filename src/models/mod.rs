pub mod record;
pub mod user;

pub use record::{RecordRow, RecordSummary};
pub use user::{User, UserRecord};
