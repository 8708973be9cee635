//! Storage backends for dealflow.
//!
//! The store traits live in [`traits`]. Two interchangeable backends
//! implement them: the in-memory mock ([`memory`], seeded from
//! [`fixtures`]) and the hosted record service ([`remote`]).

pub mod fixtures;
pub mod memory;
pub mod remote;
mod traits;

pub use fixtures::Fixtures;
pub use memory::{
    InMemoryActivityStore, InMemoryContactStore, InMemoryDealStore, InMemoryStores, SIMULATED_LATENCY,
};
pub use remote::{
    RecordClient, RemoteActivityStore, RemoteContactStore, RemoteDealStore, RemoteStores,
};
pub use traits::{ActivityStore, ContactStore, DealStore, StoreError};
