/**
 * Sale State Machine
 *
 * Open -> Finalized. Rounds are derived from time, never stored:
 *   round n ends at start_time + n * round_duration
 *
 * Geometric profile: 4 rounds, per-actor caps B / 2B / 4B / max_cap
 * Tiered profile:    3 rounds, tier t admitted from round t,
 *                    tier max in rounds 1-2, max_contribution in round 3
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;

use crate::{
    state::{Contribution, SaleConfig, SaleProfile},
    SaleError,
    PERCENT_DENOMINATOR,
};

// =============================================================================
// ENUMS
// =============================================================================

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SaleState {
    Open = 0,
    Finalized = 1,
}

impl Default for SaleState {
    fn default() -> Self {
        Self::Open
    }
}

/// Addresses that must be set before finalize
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SaleAddress {
    PresaleAllocations,
    TeamAllocations,
    AdvisorsAllocations,
    ReserveFund,
    BountyFund,
    DevelopmentFund,
}

/// Arguments for `initialize_sale`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug)]
pub struct SaleParams {
    pub start_time: i64,
    pub end_time: i64,
    pub round_duration: i64,
    pub base_cap: u64,
    pub max_cap: u64,
}

/// Amounts minted by finalize
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct FinalizeAmounts {
    pub unsold: u64,
    /// unsold + reserve_fund_value
    pub reserve: u64,
    pub bounty: u64,
    pub development: u64,
    pub presale: u64,
    pub team: u64,
    pub advisors: u64,
}

// =============================================================================
// SALE ACCOUNT
// =============================================================================

#[account]
#[derive(Default)]
pub struct Sale {
    // ─────────────────────────────────────────────────────────────────────────
    // REFERENCES
    // ─────────────────────────────────────────────────────────────────────────

    pub owner: Pubkey,
    pub config: Pubkey,
    pub whitelist: Pubkey,
    pub mint: Pubkey,
    /// Receives contributed lamports
    pub wallet: Pubkey,

    // ─────────────────────────────────────────────────────────────────────────
    // WINDOW & CAPS
    // ─────────────────────────────────────────────────────────────────────────

    pub start_time: i64,
    pub end_time: i64,
    pub round_duration: i64,
    pub base_cap: u64,
    pub max_cap: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // PROGRESS
    // ─────────────────────────────────────────────────────────────────────────

    /// Lamports raised
    pub raised: u64,
    /// Tokens minted to buyers (bonus included)
    pub tokens_sold: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // FINALIZE TARGETS
    // ─────────────────────────────────────────────────────────────────────────

    pub presale_allocations: Pubkey,
    pub team_allocations: Pubkey,
    pub advisors_allocations: Pubkey,
    pub reserve_fund: Pubkey,
    pub bounty_fund: Pubkey,
    pub development_fund: Pubkey,

    pub state: SaleState,
    /// Buyer accounts stay frozen while set
    pub transfers_paused: bool,
    /// Token accounts this sale has frozen and not yet thawed
    pub frozen_holders: u32,

    /// Bump seed for PDA
    pub bump: u8,
}

impl Sale {
    pub const LEN: usize = 8 + // discriminator
        5 * 32 + // owner, config, whitelist, mint, wallet
        8 +  // start_time
        8 +  // end_time
        8 +  // round_duration
        8 +  // base_cap
        8 +  // max_cap
        8 +  // raised
        8 +  // tokens_sold
        6 * 32 + // finalize targets
        1 +  // state
        1 +  // transfers_paused
        4 +  // frozen_holders
        1;   // bump

    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        owner: Pubkey,
        config: Pubkey,
        whitelist: Pubkey,
        mint: Pubkey,
        wallet: Pubkey,
        params: &SaleParams,
        bump: u8,
    ) -> Result<()> {
        require!(wallet != Pubkey::default(), SaleError::NullAddress);
        require!(params.start_time < params.end_time, SaleError::InvalidSaleWindow);
        require!(params.round_duration > 0, SaleError::InvalidRoundDuration);
        require!(
            params.base_cap > 0 && params.max_cap > 0 && params.base_cap <= params.max_cap,
            SaleError::InvalidCap
        );

        self.owner = owner;
        self.config = config;
        self.whitelist = whitelist;
        self.mint = mint;
        self.wallet = wallet;
        self.start_time = params.start_time;
        self.end_time = params.end_time;
        self.round_duration = params.round_duration;
        self.base_cap = params.base_cap;
        self.max_cap = params.max_cap;
        self.raised = 0;
        self.tokens_sold = 0;
        self.state = SaleState::Open;
        self.transfers_paused = true;
        self.frozen_holders = 0;
        self.bump = bump;

        Ok(())
    }

    // =========================================================================
    // ROUNDS & CAPS
    // =========================================================================

    /// End timestamp of a 1-based round
    pub fn round_end(&self, round: u8) -> i64 {
        self.start_time
            .saturating_add(self.round_duration.saturating_mul(round as i64))
    }

    /// 1-based round at `now`, 0 before the start
    pub fn current_round(&self, config: &SaleConfig, now: i64) -> u8 {
        if now < self.start_time || self.round_duration <= 0 {
            return 0;
        }
        let elapsed_rounds = (now - self.start_time) / self.round_duration;
        elapsed_rounds
            .saturating_add(1)
            .min(config.rounds() as i64) as u8
    }

    /// Geometric per-actor cap for a round, never above max_cap
    pub fn round_cap(&self, round: u8) -> u64 {
        let cap = match round {
            0 => 0,
            1 => self.base_cap,
            2 => self.base_cap.saturating_mul(2),
            3 => self.base_cap.saturating_mul(4),
            _ => self.max_cap,
        };
        cap.min(self.max_cap)
    }

    /// Cumulative cap for an actor of `tier` at `now`
    pub fn individual_cap(&self, config: &SaleConfig, tier: u8, now: i64) -> u64 {
        let round = self.current_round(config, now);
        match config.profile {
            SaleProfile::Geometric => self.round_cap(round),
            SaleProfile::Tiered => match round {
                0 => 0,
                1 | 2 => config.tier_limit(tier).map_or(0, |limit| limit.max),
                _ => config.max_contribution,
            },
        }
    }

    pub fn available_cap(&self, config: &SaleConfig, tier: u8, contributed: u64, now: i64) -> u64 {
        self.individual_cap(config, tier, now).saturating_sub(contributed)
    }

    pub fn is_cap_reached(&self, config: &SaleConfig) -> bool {
        let hard_cap_reached = config.hard_cap.map_or(false, |cap| self.raised >= cap);
        hard_cap_reached || self.tokens_sold >= config.public_sale_supply
    }

    pub fn has_ended(&self, config: &SaleConfig, now: i64) -> bool {
        now >= self.end_time || self.is_cap_reached(config)
    }

    /// tokens = amount * rate * (100 + bonus) / 100
    pub fn tokens_for(&self, config: &SaleConfig, amount: u64, now: i64) -> Result<u64> {
        let bonus = config.bonus_for_round(self.current_round(config, now)) as u128;
        let tokens = (amount as u128)
            .checked_mul(config.rate as u128)
            .and_then(|v| v.checked_mul(PERCENT_DENOMINATOR + bonus))
            .ok_or(SaleError::MathOverflow)?
            / PERCENT_DENOMINATOR;

        u64::try_from(tokens).map_err(|_| error!(SaleError::MathOverflow))
    }

    // =========================================================================
    // CONTRIBUTE
    // =========================================================================

    /// Resolve the tier an actor buys under, rejecting early tiers
    pub fn admitted_tier(&self, config: &SaleConfig, tier: Option<u8>, now: i64) -> Result<u8> {
        let tier = tier.ok_or_else(|| error!(SaleError::NotWhitelisted))?;
        if config.profile == SaleProfile::Tiered {
            require!(
                self.current_round(config, now) >= tier,
                SaleError::TierNotYetAdmitted
            );
        }
        Ok(tier)
    }

    /// Record a purchase and return the tokens owed.
    /// Nothing is written unless every check passes.
    pub fn contribute(
        &mut self,
        config: &SaleConfig,
        tier: Option<u8>,
        contribution: &mut Contribution,
        amount: u64,
        now: i64,
    ) -> Result<u64> {
        require!(self.state == SaleState::Open, SaleError::AlreadyFinalized);
        require!(now >= self.start_time, SaleError::NotStarted);
        require!(now < self.end_time, SaleError::SaleEnded);
        require!(
            contribution.beneficiary != Pubkey::default(),
            SaleError::NullAddress
        );
        require!(amount > 0, SaleError::ZeroAmount);

        let tier = self.admitted_tier(config, tier, now)?;
        if config.profile == SaleProfile::Tiered {
            let min = config.tier_limit(tier).map_or(0, |limit| limit.min);
            require!(amount >= min, SaleError::BelowTierMinimum);
        }

        let contributed = contribution
            .amount
            .checked_add(amount)
            .ok_or(SaleError::MathOverflow)?;
        require!(
            contributed <= self.individual_cap(config, tier, now),
            SaleError::IndividualCapExceeded
        );

        let tokens = self.tokens_for(config, amount, now)?;
        let tokens_sold = self
            .tokens_sold
            .checked_add(tokens)
            .ok_or(SaleError::MathOverflow)?;
        require!(
            tokens_sold <= config.public_sale_supply,
            SaleError::SupplyCapExceeded
        );

        let raised = self.raised.checked_add(amount).ok_or(SaleError::MathOverflow)?;
        if let Some(hard_cap) = config.hard_cap {
            require!(raised <= hard_cap, SaleError::HardCapExceeded);
        }

        let received = contribution
            .tokens
            .checked_add(tokens)
            .ok_or(SaleError::MathOverflow)?;

        self.tokens_sold = tokens_sold;
        self.raised = raised;
        contribution.amount = contributed;
        contribution.tokens = received;

        Ok(tokens)
    }

    // =========================================================================
    // OWNER SETTERS
    // =========================================================================

    pub fn set_base_cap(&mut self, caller: &Pubkey, base_cap: u64) -> Result<()> {
        self.require_owner(caller)?;
        require!(base_cap > 0 && base_cap <= self.max_cap, SaleError::InvalidCap);
        self.base_cap = base_cap;
        Ok(())
    }

    pub fn set_max_cap(&mut self, caller: &Pubkey, max_cap: u64) -> Result<()> {
        self.require_owner(caller)?;
        require!(max_cap > 0 && max_cap >= self.base_cap, SaleError::InvalidCap);
        self.max_cap = max_cap;
        Ok(())
    }

    pub fn set_round_duration(&mut self, caller: &Pubkey, round_duration: i64) -> Result<()> {
        self.require_owner(caller)?;
        require!(round_duration > 0, SaleError::InvalidRoundDuration);
        self.round_duration = round_duration;
        Ok(())
    }

    /// Returns the previous wallet
    pub fn change_wallet(&mut self, caller: &Pubkey, wallet: Pubkey) -> Result<Pubkey> {
        self.require_owner(caller)?;
        require!(wallet != Pubkey::default(), SaleError::NullAddress);
        Ok(std::mem::replace(&mut self.wallet, wallet))
    }

    pub fn set_address(&mut self, caller: &Pubkey, field: SaleAddress, address: Pubkey) -> Result<()> {
        self.require_owner(caller)?;
        require!(address != Pubkey::default(), SaleError::NullAddress);
        require!(self.state == SaleState::Open, SaleError::AlreadyFinalized);

        let slot = match field {
            SaleAddress::PresaleAllocations => &mut self.presale_allocations,
            SaleAddress::TeamAllocations => &mut self.team_allocations,
            SaleAddress::AdvisorsAllocations => &mut self.advisors_allocations,
            SaleAddress::ReserveFund => &mut self.reserve_fund,
            SaleAddress::BountyFund => &mut self.bounty_fund,
            SaleAddress::DevelopmentFund => &mut self.development_fund,
        };
        *slot = address;
        Ok(())
    }

    pub fn addresses_set(&self) -> bool {
        [
            self.presale_allocations,
            self.team_allocations,
            self.advisors_allocations,
            self.reserve_fund,
            self.bounty_fund,
            self.development_fund,
        ]
        .iter()
        .all(|address| *address != Pubkey::default())
    }

    // =========================================================================
    // FINALIZE
    // =========================================================================

    /// Close the sale and return what must be minted.
    /// tokens_sold + unsold == public_sale_supply afterwards.
    pub fn finalize(&mut self, caller: &Pubkey, config: &SaleConfig, now: i64) -> Result<FinalizeAmounts> {
        self.require_owner(caller)?;
        require!(self.state == SaleState::Open, SaleError::AlreadyFinalized);
        require!(self.has_ended(config, now), SaleError::SaleNotEnded);
        require!(self.addresses_set(), SaleError::AddressesNotSet);

        let unsold = config
            .public_sale_supply
            .checked_sub(self.tokens_sold)
            .ok_or(SaleError::MathOverflow)?;
        let reserve = unsold
            .checked_add(config.reserve_fund_value)
            .ok_or(SaleError::MathOverflow)?;

        self.state = SaleState::Finalized;
        self.transfers_paused = false;

        Ok(FinalizeAmounts {
            unsold,
            reserve,
            bounty: config.bounty_fund_value,
            development: config.development_fund_value,
            presale: config.presale_supply,
            team: config.team_supply,
            advisors: config.advisors_supply,
        })
    }

    pub fn require_unpaused(&self) -> Result<()> {
        require!(!self.transfers_paused, SaleError::TransfersPaused);
        Ok(())
    }

    /// Owner may take the freeze authority once the sale is closed and
    /// every holder it froze has been thawed
    pub fn require_ledger_handoff(&self, caller: &Pubkey) -> Result<()> {
        self.require_owner(caller)?;
        require!(self.state == SaleState::Finalized, SaleError::NotFinalized);
        require!(self.frozen_holders == 0, SaleError::HoldersStillFrozen);
        Ok(())
    }

    pub fn note_frozen(&mut self) -> Result<()> {
        self.frozen_holders = self
            .frozen_holders
            .checked_add(1)
            .ok_or(SaleError::MathOverflow)?;
        Ok(())
    }

    /// Thawing is only allowed once transfers are unpaused
    pub fn note_thawed(&mut self) -> Result<()> {
        self.require_unpaused()?;
        self.frozen_holders = self.frozen_holders.saturating_sub(1);
        Ok(())
    }

    pub fn require_owner(&self, caller: &Pubkey) -> Result<()> {
        require!(*caller == self.owner, SaleError::Unauthorized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{state::TierLimit, FailureKind, DEFAULT_BONUS_BY_ROUND};
    use anchor_lang::error::Error;

    const DAY: i64 = 24 * 60 * 60;
    const START: i64 = 1_700_000_000;

    fn key(n: u8) -> Pubkey {
        Pubkey::new_from_array([n; 32])
    }

    fn code(err: Error) -> u32 {
        match err {
            Error::AnchorError(e) => e.error_code_number,
            Error::ProgramError(e) => panic!("unexpected program error: {e:?}"),
        }
    }

    fn expect_err<T: std::fmt::Debug>(res: Result<T>, expected: SaleError) {
        assert_eq!(code(res.unwrap_err()), code(expected.into()));
    }

    const OWNER: u8 = 1;

    fn geometric() -> (Sale, SaleConfig) {
        let config = SaleConfig {
            profile: SaleProfile::Geometric,
            rate: 10,
            bonus_by_round: DEFAULT_BONUS_BY_ROUND,
            public_sale_supply: 1_000,
            reserve_fund_value: 50,
            bounty_fund_value: 20,
            development_fund_value: 30,
            ..Default::default()
        };
        let mut sale = Sale::default();
        sale.initialize(
            key(OWNER),
            key(2),
            key(3),
            key(4),
            key(5),
            &SaleParams {
                start_time: START,
                end_time: START + 10 * DAY,
                round_duration: DAY,
                base_cap: 3,
                max_cap: 10,
            },
            255,
        )
        .unwrap();
        (sale, config)
    }

    fn tiered() -> (Sale, SaleConfig) {
        let config = SaleConfig {
            profile: SaleProfile::Tiered,
            rate: 20,
            hard_cap: Some(30),
            tier_limits: [
                TierLimit { min: 1, max: 10 },
                TierLimit { min: 1, max: 5 },
                TierLimit { min: 2, max: 5 },
            ],
            max_contribution: 15,
            public_sale_supply: 1_000,
            ..Default::default()
        };
        let mut sale = Sale::default();
        sale.initialize(
            key(OWNER),
            key(2),
            key(3),
            key(4),
            key(5),
            &SaleParams {
                start_time: START,
                end_time: START + 9 * DAY,
                round_duration: 3 * DAY,
                base_cap: 1,
                max_cap: 1,
            },
            255,
        )
        .unwrap();
        (sale, config)
    }

    fn buyer(n: u8) -> Contribution {
        let mut contribution = Contribution::default();
        contribution.bind(key(99), key(n), 1);
        contribution
    }

    fn set_all_addresses(sale: &mut Sale) {
        for (i, field) in [
            SaleAddress::PresaleAllocations,
            SaleAddress::TeamAllocations,
            SaleAddress::AdvisorsAllocations,
            SaleAddress::ReserveFund,
            SaleAddress::BountyFund,
            SaleAddress::DevelopmentFund,
        ]
        .into_iter()
        .enumerate()
        {
            sale.set_address(&key(OWNER), field, key(40 + i as u8)).unwrap();
        }
    }

    #[test]
    fn initialize_rejects_bad_window_and_caps() {
        let base = SaleParams {
            start_time: START,
            end_time: START + DAY,
            round_duration: DAY,
            base_cap: 1,
            max_cap: 2,
        };
        let cases = [
            (SaleParams { end_time: START, ..base }, SaleError::InvalidSaleWindow),
            (SaleParams { round_duration: 0, ..base }, SaleError::InvalidRoundDuration),
            (SaleParams { base_cap: 0, ..base }, SaleError::InvalidCap),
            (SaleParams { max_cap: 0, ..base }, SaleError::InvalidCap),
            (SaleParams { base_cap: 3, ..base }, SaleError::InvalidCap),
        ];
        for (params, expected) in cases {
            let mut sale = Sale::default();
            expect_err(
                sale.initialize(key(1), key(2), key(3), key(4), key(5), &params, 1),
                expected,
            );
        }

        let mut sale = Sale::default();
        expect_err(
            sale.initialize(key(1), key(2), key(3), key(4), Pubkey::default(), &base, 1),
            SaleError::NullAddress,
        );
    }

    #[test]
    fn geometric_rounds_and_caps() {
        let (sale, config) = geometric();

        assert_eq!(sale.current_round(&config, START - 1), 0);
        assert_eq!(sale.current_round(&config, START), 1);
        assert_eq!(sale.current_round(&config, START + DAY - 1), 1);
        assert_eq!(sale.current_round(&config, START + DAY), 2);
        assert_eq!(sale.current_round(&config, START + 2 * DAY), 3);
        assert_eq!(sale.current_round(&config, START + 3 * DAY), 4);
        assert_eq!(sale.current_round(&config, START + 9 * DAY), 4);

        let caps: Vec<u64> = (1..=4).map(|round| sale.round_cap(round)).collect();
        assert_eq!(caps, vec![3, 6, 10, 10]);
        assert_eq!(sale.individual_cap(&config, 1, START + DAY), 6);
        assert_eq!(sale.available_cap(&config, 1, 4, START + DAY), 2);
        assert_eq!(sale.available_cap(&config, 1, 8, START + DAY), 0);
    }

    #[test]
    fn geometric_bonus_scenario() {
        let (mut sale, config) = geometric();
        let mut contribution = buyer(10);

        let first = sale
            .contribute(&config, Some(1), &mut contribution, 1, START)
            .unwrap();
        assert_eq!(first, 12);

        let second = sale
            .contribute(&config, Some(1), &mut contribution, 1, START + DAY)
            .unwrap();
        assert_eq!(second, 11);

        assert_eq!(contribution.amount, 2);
        assert_eq!(contribution.tokens, 23);
        assert_eq!(sale.tokens_sold, 23);
        assert_eq!(sale.raised, 2);
        assert!(contribution.amount <= sale.individual_cap(&config, 1, START + DAY));
    }

    #[test]
    fn individual_cap_is_cumulative() {
        let (mut sale, config) = geometric();
        let mut contribution = buyer(10);

        sale.contribute(&config, Some(2), &mut contribution, 3, START).unwrap();
        expect_err(
            sale.contribute(&config, Some(2), &mut contribution, 1, START),
            SaleError::IndividualCapExceeded,
        );
        assert_eq!(contribution.amount, 3);
        assert_eq!(sale.raised, 3);

        // round 2 doubles the cap
        sale.contribute(&config, Some(2), &mut contribution, 3, START + DAY).unwrap();
        assert_eq!(contribution.amount, 6);
    }

    #[test]
    fn contribute_rejects_outside_window() {
        let (mut sale, config) = geometric();
        let mut contribution = buyer(10);

        expect_err(
            sale.contribute(&config, Some(1), &mut contribution, 1, START - 1),
            SaleError::NotStarted,
        );
        expect_err(
            sale.contribute(&config, Some(1), &mut contribution, 1, sale.end_time),
            SaleError::SaleEnded,
        );
        assert_eq!(sale.tokens_sold, 0);
    }

    #[test]
    fn contribute_rejects_bad_arguments() {
        let (mut sale, config) = geometric();

        let mut nobody = Contribution::default();
        expect_err(
            sale.contribute(&config, Some(1), &mut nobody, 1, START),
            SaleError::NullAddress,
        );

        let mut contribution = buyer(10);
        expect_err(
            sale.contribute(&config, Some(1), &mut contribution, 0, START),
            SaleError::ZeroAmount,
        );
        expect_err(
            sale.contribute(&config, None, &mut contribution, 1, START),
            SaleError::NotWhitelisted,
        );
    }

    #[test]
    fn supply_cap_blocks_and_ends_sale() {
        let (mut sale, mut config) = geometric();
        config.public_sale_supply = 36;
        let mut a = buyer(10);
        let mut b = buyer(11);

        // 2 * 10 * 1.2 = 24 tokens
        sale.contribute(&config, Some(1), &mut a, 2, START).unwrap();
        expect_err(
            sale.contribute(&config, Some(1), &mut b, 2, START),
            SaleError::SupplyCapExceeded,
        );
        assert_eq!(b.amount, 0);
        assert!(!sale.has_ended(&config, START));

        // 12 more tokens fills the supply exactly
        sale.contribute(&config, Some(1), &mut b, 1, START).unwrap();
        assert_eq!(sale.tokens_sold, config.public_sale_supply);
        assert!(sale.is_cap_reached(&config));
        assert!(sale.has_ended(&config, START));

        let mut c = buyer(12);
        expect_err(
            sale.contribute(&config, Some(1), &mut c, 1, START),
            SaleError::SupplyCapExceeded,
        );
    }

    #[test]
    fn tiered_admission_by_round() {
        let (mut sale, config) = tiered();
        let round2 = sale.round_end(1);
        let round3 = sale.round_end(2);

        let mut tier1 = buyer(10);
        let mut tier2 = buyer(11);
        let mut tier3 = buyer(12);

        expect_err(
            sale.contribute(&config, Some(2), &mut tier2, 1, START),
            SaleError::TierNotYetAdmitted,
        );
        sale.contribute(&config, Some(1), &mut tier1, 10, START).unwrap();
        expect_err(
            sale.contribute(&config, Some(1), &mut tier1, 1, START),
            SaleError::IndividualCapExceeded,
        );

        expect_err(
            sale.contribute(&config, Some(3), &mut tier3, 2, round2),
            SaleError::TierNotYetAdmitted,
        );
        expect_err(
            sale.contribute(&config, Some(2), &mut tier2, 6, round2),
            SaleError::IndividualCapExceeded,
        );
        sale.contribute(&config, Some(2), &mut tier2, 5, round2).unwrap();

        expect_err(
            sale.contribute(&config, Some(3), &mut tier3, 1, round3),
            SaleError::BelowTierMinimum,
        );
        sale.contribute(&config, Some(3), &mut tier3, 2, round3).unwrap();
        sale.contribute(&config, Some(1), &mut tier1, 5, round3).unwrap();

        assert_eq!(sale.raised, 22);
        // tiered config here carries no bonus
        assert_eq!(sale.tokens_sold, 22 * 20);
    }

    #[test]
    fn tiered_hard_cap_allows_early_finalize() {
        let (mut sale, config) = tiered();
        let round3 = sale.round_end(2);
        set_all_addresses(&mut sale);

        let mut a = buyer(10);
        let mut b = buyer(11);
        sale.contribute(&config, Some(1), &mut a, 15, round3).unwrap();
        expect_err(
            sale.contribute(&config, Some(1), &mut b, 16, round3),
            SaleError::IndividualCapExceeded,
        );
        sale.contribute(&config, Some(1), &mut b, 15, round3).unwrap();

        let mut c = buyer(12);
        expect_err(
            sale.contribute(&config, Some(1), &mut c, 1, round3),
            SaleError::HardCapExceeded,
        );
        assert!(sale.is_cap_reached(&config));
        assert!(sale.finalize(&key(OWNER), &config, round3).is_ok());
    }

    #[test]
    fn setters_are_owner_only_and_validated() {
        let (mut sale, _) = geometric();
        let owner = key(OWNER);

        expect_err(sale.set_base_cap(&key(9), 2), SaleError::Unauthorized);
        expect_err(sale.set_base_cap(&owner, 0), SaleError::InvalidCap);
        expect_err(sale.set_base_cap(&owner, 11), SaleError::InvalidCap);
        sale.set_base_cap(&owner, 10).unwrap();

        expect_err(sale.set_max_cap(&owner, 9), SaleError::InvalidCap);
        expect_err(sale.set_max_cap(&owner, 0), SaleError::InvalidCap);
        sale.set_max_cap(&owner, 20).unwrap();

        expect_err(sale.set_round_duration(&owner, 0), SaleError::InvalidRoundDuration);
        expect_err(sale.set_round_duration(&key(9), DAY), SaleError::Unauthorized);
        sale.set_round_duration(&owner, 2 * DAY).unwrap();

        expect_err(sale.change_wallet(&owner, Pubkey::default()), SaleError::NullAddress);
        expect_err(sale.change_wallet(&key(9), key(6)), SaleError::Unauthorized);
        assert_eq!(sale.change_wallet(&owner, key(6)).unwrap(), key(5));
        assert_eq!(sale.wallet, key(6));

        expect_err(
            sale.set_address(&owner, SaleAddress::ReserveFund, Pubkey::default()),
            SaleError::NullAddress,
        );
        expect_err(
            sale.set_address(&key(9), SaleAddress::ReserveFund, key(7)),
            SaleError::Unauthorized,
        );
    }

    #[test]
    fn finalize_preconditions() {
        let (mut sale, config) = geometric();
        let owner = key(OWNER);
        let end = sale.end_time;

        expect_err(sale.finalize(&owner, &config, end - 1), SaleError::SaleNotEnded);
        expect_err(sale.finalize(&owner, &config, end), SaleError::AddressesNotSet);

        set_all_addresses(&mut sale);
        expect_err(sale.finalize(&key(9), &config, end), SaleError::Unauthorized);
        expect_err(sale.require_unpaused(), SaleError::TransfersPaused);
        expect_err(sale.require_ledger_handoff(&owner), SaleError::NotFinalized);

        sale.finalize(&owner, &config, end).unwrap();
        assert_eq!(sale.state, SaleState::Finalized);
        assert!(sale.require_unpaused().is_ok());
        assert!(sale.require_ledger_handoff(&owner).is_ok());
        expect_err(sale.require_ledger_handoff(&key(9)), SaleError::Unauthorized);

        expect_err(sale.finalize(&owner, &config, end), SaleError::AlreadyFinalized);
        expect_err(
            sale.set_address(&owner, SaleAddress::BountyFund, key(8)),
            SaleError::AlreadyFinalized,
        );
    }

    #[test]
    fn ledger_handoff_waits_for_every_holder_thaw() {
        let (mut sale, config) = geometric();
        let owner = key(OWNER);
        set_all_addresses(&mut sale);

        // two buyer accounts frozen during the sale
        sale.note_frozen().unwrap();
        sale.note_frozen().unwrap();
        expect_err(sale.note_thawed(), SaleError::TransfersPaused);
        assert_eq!(sale.frozen_holders, 2);

        sale.finalize(&owner, &config, sale.end_time).unwrap();
        expect_err(sale.require_ledger_handoff(&owner), SaleError::HoldersStillFrozen);

        sale.note_thawed().unwrap();
        expect_err(sale.require_ledger_handoff(&owner), SaleError::HoldersStillFrozen);
        sale.note_thawed().unwrap();
        assert!(sale.require_ledger_handoff(&owner).is_ok());
        assert_eq!(SaleError::HoldersStillFrozen.kind(), FailureKind::State);
    }

    #[test]
    fn finalize_conserves_public_supply() {
        let (mut sale, config) = geometric();
        let mut contribution = buyer(10);
        sale.contribute(&config, Some(1), &mut contribution, 3, START).unwrap();
        set_all_addresses(&mut sale);

        let amounts = sale.finalize(&key(OWNER), &config, sale.end_time).unwrap();

        assert_eq!(sale.tokens_sold + amounts.unsold, config.public_sale_supply);
        assert_eq!(amounts.unsold, 1_000 - 36);
        assert_eq!(amounts.reserve, amounts.unsold + 50);
        assert_eq!(amounts.bounty, 20);
        assert_eq!(amounts.development, 30);
    }

    #[test]
    fn contribute_after_finalize_is_a_state_error() {
        let (mut sale, config) = tiered();
        set_all_addresses(&mut sale);
        sale.finalize(&key(OWNER), &config, sale.end_time).unwrap();

        let mut contribution = buyer(10);
        let err = sale
            .contribute(&config, Some(1), &mut contribution, 1, START)
            .unwrap_err();
        assert_eq!(code(err), code(SaleError::AlreadyFinalized.into()));
        assert_eq!(SaleError::AlreadyFinalized.kind(), crate::FailureKind::State);
    }
}
