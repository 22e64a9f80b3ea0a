/**
 * Instructions for Tiered Sale
 * 
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

pub mod whitelist;
pub mod sale_config;
pub mod sale;
pub mod contribute;
pub mod finalize;
pub mod allocations;
pub mod vesting;

pub use whitelist::*;
pub use sale_config::*;
pub use sale::*;
pub use contribute::*;
pub use finalize::*;
pub use allocations::*;
pub use vesting::*;
