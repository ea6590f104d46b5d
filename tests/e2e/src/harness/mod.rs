//! Test harness

mod vault_manager;

pub use vault_manager::TestVault;
