pub mod decode;
pub mod errors;
pub mod id;
pub mod protocol;

pub use decode::Utf8Carry;
pub use errors::{ConfigError, PanesError, SessionError};
pub use id::{connection_id, SessionKey};
pub use protocol::{ExecuteReply, ExecuteRequest, ServiceStatus};

pub type Result<T> = std::result::Result<T, PanesError>;
