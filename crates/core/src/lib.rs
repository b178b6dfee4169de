pub mod document;
pub mod event;
pub mod request;
pub mod session;
pub mod types;

pub use document::DocumentRef;
pub use event::{ProgressEvent, RetrievalHandles, SessionEvent};
pub use request::{CreateSessionRequest, DEFAULT_SESSION_TIMEOUT, SignatureRequest};
pub use session::{SessionStatus, SignatureSession};
pub use types::{CompanyId, SessionId, TabletId};
