//! Courier Core Library
//!
//! Protocol session engine for an end-to-end encrypted relay messaging
//! client. Speaks a fixed binary request/response protocol to a relay
//! server and layers hybrid encryption on top: an asymmetric key wrap
//! bootstraps a per-peer symmetric session key, which then encrypts
//! direct messages.
//!
//! Everything is synchronous and single-threaded; each operation on the
//! [`SessionClient`] facade is one blocking round trip.

pub mod crypto;
pub mod directory;
pub mod dispatch;
pub mod exchange;
pub mod identity;
pub mod network;
pub mod session;
pub mod wire;

pub use crypto::{
    AesGcmCipher, AsymmetricCipher, CryptoError, SealedBoxCipher, SessionKey, SymmetricCipher,
};
pub use directory::{DirectoryError, KeyState, PeerDirectory, PeerRecord};
pub use dispatch::{
    drain_batch, DispatchError, Envelope, InterpretedEvent, MessageDispatch,
};
pub use exchange::{ExchangeError, KeyExchange};
pub use identity::{
    ClientIdentity, FileIdentityStore, IdentityError, IdentityStore, DEFAULT_IDENTITY_FILE,
};
pub use network::{MockTransport, NetworkError, TcpTransport, Transport, TransportConfig};
pub use session::{PollResult, SessionClient, SessionError};
pub use wire::{ClientId, MessageKind, RequestCode, ResponseCode, WireError};
