/**
 * Whitelist State
 *
 * Tiered admission registry. Tier 1 buyers enter the sale in round 1,
 * tier 2 in round 2 and tier 3 in round 3.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;

use crate::{SaleError, MAX_TIER, MAX_WHITELIST_ENTRIES, MIN_TIER};

/// Single admitted actor
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct WhitelistEntry {
    pub actor: Pubkey,
    pub tier: u8,
}

impl WhitelistEntry {
    pub const LEN: usize = 32 + 1;
}

/// Whitelist account
/// Entries are kept dense; revoking swaps the last entry into the freed slot
#[account]
#[derive(Default)]
pub struct Whitelist {
    /// Owner who appoints the admin
    pub owner: Pubkey,

    /// Admin who admits and revokes actors
    pub admin: Pubkey,

    /// Admitted actors (order is not stable across revokes)
    pub entries: Vec<WhitelistEntry>,

    /// Bump seed for PDA
    pub bump: u8,
}

impl Whitelist {
    pub const LEN: usize = 8 + // discriminator
        32 + // owner
        32 + // admin
        4 + MAX_WHITELIST_ENTRIES * WhitelistEntry::LEN + // entries
        1;   // bump

    pub fn initialize(&mut self, owner: Pubkey, bump: u8) {
        self.owner = owner;
        self.admin = Pubkey::default();
        self.entries = Vec::new();
        self.bump = bump;
    }

    pub fn set_admin(&mut self, caller: &Pubkey, admin: Pubkey) -> Result<()> {
        require!(*caller == self.owner, SaleError::Unauthorized);
        require!(admin != Pubkey::default(), SaleError::NullAddress);

        self.admin = admin;
        Ok(())
    }

    /// Admit an actor. A tier change requires revoking first.
    pub fn admit(&mut self, caller: &Pubkey, actor: Pubkey, tier: u8) -> Result<()> {
        self.require_admin(caller)?;
        require!(actor != Pubkey::default(), SaleError::NullAddress);
        require!((MIN_TIER..=MAX_TIER).contains(&tier), SaleError::InvalidTier);
        require!(!self.is_admitted(&actor), SaleError::AlreadyAdmitted);
        require!(self.entries.len() < MAX_WHITELIST_ENTRIES, SaleError::WhitelistFull);

        self.entries.push(WhitelistEntry { actor, tier });
        Ok(())
    }

    /// Remove an actor, returning the tier it held
    pub fn revoke(&mut self, caller: &Pubkey, actor: &Pubkey) -> Result<u8> {
        self.require_admin(caller)?;

        let index = self
            .position(actor)
            .ok_or_else(|| error!(SaleError::NotAdmitted))?;
        let removed = self.entries.swap_remove(index);

        Ok(removed.tier)
    }

    pub fn is_admitted(&self, actor: &Pubkey) -> bool {
        self.position(actor).is_some()
    }

    pub fn tier_of(&self, actor: &Pubkey) -> Option<u8> {
        self.entries
            .iter()
            .find(|entry| entry.actor == *actor)
            .map(|entry| entry.tier)
    }

    pub fn count(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn address_at(&self, index: u32) -> Result<Pubkey> {
        self.entries
            .get(index as usize)
            .map(|entry| entry.actor)
            .ok_or_else(|| error!(SaleError::IndexOutOfRange))
    }

    fn position(&self, actor: &Pubkey) -> Option<usize> {
        self.entries.iter().position(|entry| entry.actor == *actor)
    }

    fn require_admin(&self, caller: &Pubkey) -> Result<()> {
        require!(
            self.admin != Pubkey::default() && *caller == self.admin,
            SaleError::Unauthorized
        );
        Ok(())
    }
}
