//! archway-chain
//!
//! Local devnet lifecycle on top of `archwayd`.
//!
//! `chain new` sequence (each step depends on the on-disk effects of the
//! previous one, so nothing runs concurrently):
//!   1. Validate moniker / chain-id / denom
//!   2. Confirm with the operator, read the keyring passphrase
//!   3. Create the validator key and the tester keys
//!   4. `archwayd init`
//!   5. Patch the genesis denoms
//!   6. Fund every key with a genesis account
//!   7. `gentx` for the validator, then `collect-gentxs`
//!
//! `start` and `reset` attach to a long-running daemon process and forward
//! its output; `snapshot` archives the data directory.

pub mod init;
pub mod lifecycle;
pub mod snapshot;

pub use init::{ChainBootstrap, ChainInitializer, ChainOptions, FundingReport};
pub use lifecycle::{reset, start, AttachedProcess, Sink};
pub use snapshot::{make_snapshot, snapshot_file_name};
