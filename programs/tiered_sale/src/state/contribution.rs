/**
 * Contribution State
 *
 * Per-beneficiary running totals, checked against the round caps.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;

#[account]
#[derive(Default)]
pub struct Contribution {
    /// Sale this record belongs to
    pub sale: Pubkey,

    /// Actor receiving the tokens
    pub beneficiary: Pubkey,

    /// Cumulative lamports contributed
    pub amount: u64,

    /// Cumulative tokens received
    pub tokens: u64,

    /// Bump seed for PDA
    pub bump: u8,
}

impl Contribution {
    pub const LEN: usize = 8 + // discriminator
        32 + // sale
        32 + // beneficiary
        8 +  // amount
        8 +  // tokens
        1;   // bump

    /// Fill in identity on first use (account is created with init_if_needed)
    pub fn bind(&mut self, sale: Pubkey, beneficiary: Pubkey, bump: u8) {
        if self.sale == Pubkey::default() {
            self.sale = sale;
            self.beneficiary = beneficiary;
            self.bump = bump;
        }
    }
}
