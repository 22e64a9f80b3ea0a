/**
 * Sale Configuration State
 *
 * Immutable sale economics: profile, rate, bonus table, caps,
 * per-tier limits and the supply split minted at finalize.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;

use crate::{SaleError, GEOMETRIC_ROUNDS, MAX_TIER, MIN_TIER, TIERED_ROUNDS};

/// Round/cap schedule a sale runs under
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SaleProfile {
    /// Four rounds, caps B / 2B / 4B / max, any whitelisted actor
    Geometric = 0,
    /// Three rounds, tier t admitted from round t, per-tier limits
    Tiered = 1,
}

impl Default for SaleProfile {
    fn default() -> Self {
        Self::Geometric
    }
}

/// Contribution bounds for one whitelist tier
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct TierLimit {
    /// Smallest single contribution (lamports)
    pub min: u64,
    /// Largest cumulative contribution in rounds 1-2 (lamports)
    pub max: u64,
}

/// Arguments for `initialize_sale_config`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug)]
pub struct SaleConfigParams {
    pub profile: SaleProfile,
    pub rate: u64,
    pub bonus_by_round: [u8; 4],
    pub hard_cap: Option<u64>,
    pub tier_limits: [TierLimit; 3],
    pub max_contribution: u64,
    pub public_sale_supply: u64,
    pub presale_supply: u64,
    pub team_supply: u64,
    pub advisors_supply: u64,
    pub reserve_fund_value: u64,
    pub bounty_fund_value: u64,
    pub development_fund_value: u64,
}

/// Sale configuration account (one per mint)
#[account]
#[derive(Default)]
pub struct SaleConfig {
    /// Creator; must also own the sale
    pub authority: Pubkey,

    /// Token being sold
    pub mint: Pubkey,

    pub profile: SaleProfile,

    /// Token base units per lamport
    pub rate: u64,

    /// Bonus percent for rounds 1..4
    pub bonus_by_round: [u8; 4],

    /// Total lamports the sale accepts, if bounded
    pub hard_cap: Option<u64>,

    /// Limits for tiers 1..3 (tiered profile)
    pub tier_limits: [TierLimit; 3],

    /// Per-actor cap in the final tiered round
    pub max_contribution: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // SUPPLY SPLIT
    // ─────────────────────────────────────────────────────────────────────────

    pub public_sale_supply: u64,
    pub presale_supply: u64,
    pub team_supply: u64,
    pub advisors_supply: u64,
    pub reserve_fund_value: u64,
    pub bounty_fund_value: u64,
    pub development_fund_value: u64,

    /// Bump seed for PDA
    pub bump: u8,
}

impl SaleConfig {
    pub const LEN: usize = 8 + // discriminator
        32 + // authority
        32 + // mint
        1 +  // profile
        8 +  // rate
        4 +  // bonus_by_round
        1 + 8 + // hard_cap
        3 * 16 + // tier_limits
        8 +  // max_contribution
        7 * 8 + // supply split
        1;   // bump

    pub fn validate(params: &SaleConfigParams) -> Result<()> {
        require!(params.rate > 0, SaleError::InvalidRate);
        require!(params.public_sale_supply > 0, SaleError::InvalidSupply);
        require!(
            params.bonus_by_round.iter().all(|bonus| *bonus <= 100),
            SaleError::InvalidBonus
        );
        if let Some(hard_cap) = params.hard_cap {
            require!(hard_cap > 0, SaleError::InvalidCap);
        }
        require!(
            params.tier_limits.iter().all(|limit| limit.min <= limit.max),
            SaleError::InvalidTierLimits
        );

        if params.profile == SaleProfile::Tiered {
            require!(
                params.tier_limits.iter().all(|limit| limit.max > 0),
                SaleError::InvalidTierLimits
            );
            require!(params.max_contribution > 0, SaleError::InvalidCap);
            // round 3 must not cap anyone below what rounds 1-2 allowed
            require!(
                params
                    .tier_limits
                    .iter()
                    .all(|limit| limit.max <= params.max_contribution),
                SaleError::InvalidCap
            );
        }

        Ok(())
    }

    pub fn initialize(
        &mut self,
        authority: Pubkey,
        mint: Pubkey,
        params: &SaleConfigParams,
        bump: u8,
    ) -> Result<()> {
        Self::validate(params)?;

        self.authority = authority;
        self.mint = mint;
        self.profile = params.profile;
        self.rate = params.rate;
        self.bonus_by_round = params.bonus_by_round;
        self.hard_cap = params.hard_cap;
        self.tier_limits = params.tier_limits;
        self.max_contribution = params.max_contribution;
        self.public_sale_supply = params.public_sale_supply;
        self.presale_supply = params.presale_supply;
        self.team_supply = params.team_supply;
        self.advisors_supply = params.advisors_supply;
        self.reserve_fund_value = params.reserve_fund_value;
        self.bounty_fund_value = params.bounty_fund_value;
        self.development_fund_value = params.development_fund_value;
        self.bump = bump;

        Ok(())
    }

    /// Number of rounds the profile runs
    pub fn rounds(&self) -> u8 {
        match self.profile {
            SaleProfile::Geometric => GEOMETRIC_ROUNDS,
            SaleProfile::Tiered => TIERED_ROUNDS,
        }
    }

    /// Bonus percent for a 1-based round (0 outside the table)
    pub fn bonus_for_round(&self, round: u8) -> u8 {
        match round {
            1..=4 => self.bonus_by_round[(round - 1) as usize],
            _ => 0,
        }
    }

    pub fn tier_limit(&self, tier: u8) -> Option<TierLimit> {
        if (MIN_TIER..=MAX_TIER).contains(&tier) {
            Some(self.tier_limits[(tier - MIN_TIER) as usize])
        } else {
            None
        }
    }
}
