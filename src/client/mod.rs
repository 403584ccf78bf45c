//! Client side of the chat: HTTP transport, the local fallback cache, the
//! conversation controller and the quota indicator.

pub mod controller;
pub mod quota;
pub mod storage;
pub mod transport;

pub use controller::{ BootstrapSource, ConversationController, SendOutcome, SendStatus };
pub use quota::{ QuotaIndicator, QuotaRefresh };
pub use storage::{ FileStorage, LocalStorage, MemoryStorage, StorageError };
pub use transport::{ ChatTransport, HttpTransport, TransportError };
