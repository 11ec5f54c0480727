// ── State tree access ──
//
// The store contract, the in-memory reference store, its change stream,
// and the idempotent provisioner built on top of the contract.

mod memory;
mod provision;
mod store;
mod stream;

pub use memory::{MemoryStateStore, StateChange, TreeEntry};
pub use provision::StateProvisioner;
pub use store::{StateStore, StateWrite, WriteNotification, WriteOutcome};
pub use stream::StateChangeStream;
