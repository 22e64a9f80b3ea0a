/**
 * Linear Vesting State
 *
 * Cliff + linear schedule created when an allocation with a vested
 * portion is distributed. The ramp is computed against everything the
 * schedule has ever held for a mint (current balance + released), so
 * tokens sent in later vest at the already-elapsed fraction.
 *
 * The allocation's own mint holds the first release slot from creation;
 * other mints sent to the schedule share what is left.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;

use crate::{SaleError, MAX_VESTING_ASSETS};

/// Cumulative amount released for one mint
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct AssetRelease {
    pub mint: Pubkey,
    pub amount: u64,
}

impl AssetRelease {
    pub const LEN: usize = 32 + 8;
}

/// Linear vesting schedule account
#[account]
#[derive(Default)]
pub struct LinearVesting {
    /// Receives released tokens
    pub beneficiary: Pubkey,

    /// Allocation registry that created this schedule
    pub registry: Pubkey,

    /// Mint the allocation was paid in
    pub mint: Pubkey,

    /// Timestamp the schedule was created
    pub start: i64,

    /// Seconds after start before anything vests
    pub cliff: i64,

    /// Seconds from start until fully vested
    pub duration: i64,

    /// Released amounts per mint
    pub releases: Vec<AssetRelease>,

    /// Bump seed for PDA
    pub bump: u8,
}

impl LinearVesting {
    pub const LEN: usize = 8 + // discriminator
        32 + // beneficiary
        32 + // registry
        32 + // mint
        8 +  // start
        8 +  // cliff
        8 +  // duration
        4 + MAX_VESTING_ASSETS * AssetRelease::LEN + // releases
        1;   // bump

    pub fn initialize(
        &mut self,
        beneficiary: Pubkey,
        registry: Pubkey,
        mint: Pubkey,
        start: i64,
        cliff: i64,
        duration: i64,
        bump: u8,
    ) -> Result<()> {
        require!(beneficiary != Pubkey::default(), SaleError::NullAddress);
        require!(mint != Pubkey::default(), SaleError::NullAddress);
        require!(duration > 0, SaleError::MissingVestingDuration);
        require!(cliff >= 0 && cliff <= duration, SaleError::InvalidVestingTerms);

        self.beneficiary = beneficiary;
        self.registry = registry;
        self.mint = mint;
        self.start = start;
        self.cliff = cliff;
        self.duration = duration;
        self.releases = vec![AssetRelease { mint, amount: 0 }];
        self.bump = bump;

        Ok(())
    }

    pub fn released(&self, mint: &Pubkey) -> u64 {
        self.releases
            .iter()
            .find(|release| release.mint == *mint)
            .map_or(0, |release| release.amount)
    }

    /// Check if cliff period has passed
    pub fn cliff_passed(&self, now: i64) -> bool {
        now >= self.start.saturating_add(self.cliff)
    }

    /// Vested amount for a mint given the schedule's current balance
    pub fn vested_amount(&self, mint: &Pubkey, balance: u64, now: i64) -> Result<u64> {
        if !self.cliff_passed(now) {
            return Ok(0);
        }

        let total = balance
            .checked_add(self.released(mint))
            .ok_or(SaleError::MathOverflow)?;
        let elapsed = now - self.start;
        if elapsed >= self.duration {
            return Ok(total);
        }

        // elapsed < duration, so the result fits in u64
        let vested = (total as u128) * (elapsed as u128) / (self.duration as u128);
        Ok(vested as u64)
    }

    pub fn releasable_amount(&self, mint: &Pubkey, balance: u64, now: i64) -> Result<u64> {
        Ok(self
            .vested_amount(mint, balance, now)?
            .saturating_sub(self.released(mint)))
    }

    /// Record a release and return the amount to transfer
    pub fn release(&mut self, mint: &Pubkey, balance: u64, now: i64) -> Result<u64> {
        let amount = self.releasable_amount(mint, balance, now)?;
        require!(amount > 0, SaleError::NothingToRelease);

        match self.releases.iter_mut().find(|release| release.mint == *mint) {
            Some(release) => {
                release.amount = release
                    .amount
                    .checked_add(amount)
                    .ok_or(SaleError::MathOverflow)?;
            }
            None => {
                require!(
                    self.releases.len() < MAX_VESTING_ASSETS,
                    SaleError::TooManyVestingAssets
                );
                self.releases.push(AssetRelease { mint: *mint, amount });
            }
        }

        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn schedule(cliff: i64, duration: i64) -> LinearVesting {
        let mut vesting = LinearVesting::default();
        vesting.initialize(key(1), key(2), key(5), START, cliff, duration, 253).unwrap();
        vesting
    }

    /// Balance held after `released` has already left the schedule
    fn held(total: u64, vesting: &LinearVesting, mint: &Pubkey) -> u64 {
        total - vesting.released(mint)
    }

    #[test]
    fn construction_rejects_bad_terms() {
        let cases = [
            (key(1), key(5), 0, 0, SaleError::MissingVestingDuration),
            (Pubkey::default(), key(5), 0, DAY, SaleError::NullAddress),
            (key(1), Pubkey::default(), 0, DAY, SaleError::NullAddress),
            (key(1), key(5), 2 * DAY, DAY, SaleError::InvalidVestingTerms),
        ];
        for (beneficiary, mint, cliff, duration, expected) in cases {
            let mut vesting = LinearVesting::default();
            let err = vesting
                .initialize(beneficiary, key(2), mint, START, cliff, duration, 1)
                .unwrap_err();
            assert_eq!(code(err), code(expected.into()));
        }
    }

    #[test]
    fn nothing_vests_before_cliff() {
        let vesting = schedule(25 * DAY, 100 * DAY);
        let mint = key(5);

        assert_eq!(vesting.vested_amount(&mint, 100, START).unwrap(), 0);
        assert_eq!(vesting.vested_amount(&mint, 100, START + 25 * DAY - 1).unwrap(), 0);
        assert_eq!(vesting.vested_amount(&mint, 100, START + 25 * DAY).unwrap(), 25);
    }

    #[test]
    fn releases_linearly_after_cliff() {
        let mut vesting = schedule(25 * DAY, 100 * DAY);
        let mint = key(5);

        let mut released_total = 0;
        for (pct, expected) in [(30, 30), (50, 50), (60, 60)] {
            let now = START + pct * DAY;
            let amount = vesting.release(&mint, held(100, &vesting, &mint), now).unwrap();
            released_total += amount;
            assert_eq!(released_total, expected);
            assert_eq!(vesting.released(&mint), expected);
        }
    }

    #[test]
    fn release_fails_when_nothing_is_due() {
        let mut vesting = schedule(25 * DAY, 100 * DAY);
        let mint = key(5);

        let err = vesting.release(&mint, 100, START + DAY).unwrap_err();
        assert_eq!(code(err), code(SaleError::NothingToRelease.into()));

        vesting.release(&mint, 100, START + 50 * DAY).unwrap();
        let err = vesting.release(&mint, 50, START + 50 * DAY).unwrap_err();
        assert_eq!(code(err), code(SaleError::NothingToRelease.into()));
    }

    #[test]
    fn fully_vested_after_duration() {
        let mut vesting = schedule(25 * DAY, 100 * DAY);
        let mint = key(5);

        assert_eq!(vesting.release(&mint, 100, START + 100 * DAY).unwrap(), 100);
        assert_eq!(vesting.releasable_amount(&mint, 0, START + 200 * DAY).unwrap(), 0);
    }

    #[test]
    fn late_top_up_vests_at_elapsed_fraction() {
        let mut vesting = schedule(0, 100 * DAY);
        let mint = key(5);

        vesting.release(&mint, 100, START + 100 * DAY).unwrap();

        // 40 tokens sent after full vesting are immediately releasable
        assert_eq!(vesting.release(&mint, 40, START + 101 * DAY).unwrap(), 40);
        assert_eq!(vesting.released(&mint), 140);
    }

    #[test]
    fn tracks_mints_independently() {
        let mut vesting = schedule(0, 10 * DAY);
        let now = START + 5 * DAY;

        assert_eq!(vesting.releases.len(), 1);
        for n in 1..MAX_VESTING_ASSETS as u8 {
            assert_eq!(vesting.release(&key(10 + n), 10, now).unwrap(), 5);
        }
        let err = vesting.release(&key(99), 10, now).unwrap_err();
        assert_eq!(code(err), code(SaleError::TooManyVestingAssets.into()));
        assert_eq!(vesting.released(&key(11)), 5);
        assert_eq!(vesting.released(&key(99)), 0);
        assert_eq!(vesting.release(&key(5), 10, now).unwrap(), 5);
    }

    #[test]
    fn stray_mints_cannot_lock_out_allocation_mint() {
        let mut vesting = schedule(25 * DAY, 100 * DAY);
        let cliff = START + 25 * DAY;

        // dust of unrelated mints sent to the schedule and released at the cliff
        for n in 100..100 + MAX_VESTING_ASSETS as u8 {
            let _ = vesting.release(&key(n), 4, cliff);
        }
        assert_eq!(vesting.releases.len(), MAX_VESTING_ASSETS);

        assert_eq!(vesting.release(&key(5), 1_000, cliff + DAY).unwrap(), 260);
        let rest = held(1_000, &vesting, &key(5));
        assert_eq!(vesting.release(&key(5), rest, START + 200 * DAY).unwrap(), 740);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Zero before the cliff, the whole balance after the duration,
            /// and never decreasing in between
            #[test]
            fn prop_vesting_is_monotone_and_bounded(
                cliff_days in 0i64..50,
                extra_days in 1i64..100,
                total in 0u64..=1_000_000_000_000,
                mut times in prop::collection::vec(0i64..200 * DAY, 1..20),
            ) {
                let duration = (cliff_days + extra_days) * DAY;
                let vesting = schedule(cliff_days * DAY, duration);
                let mint = key(5);
                times.sort_unstable();

                let mut last = 0;
                for offset in times {
                    let now = START + offset;
                    let vested = vesting.vested_amount(&mint, total, now).unwrap();
                    if offset < cliff_days * DAY {
                        prop_assert_eq!(vested, 0);
                    }
                    if offset >= duration {
                        prop_assert_eq!(vested, total);
                    }
                    prop_assert!(vested <= total);
                    prop_assert!(vested >= last);
                    last = vested;
                }
            }

            /// Releasing at arbitrary times never pays out more than was held
            #[test]
            fn prop_releases_never_exceed_total(
                total in 1u64..=1_000_000_000,
                mut times in prop::collection::vec(0i64..120 * DAY, 1..20),
            ) {
                let mut vesting = schedule(10 * DAY, 100 * DAY);
                let mint = key(5);
                times.sort_unstable();

                for offset in times {
                    let balance = total - vesting.released(&mint);
                    let _ = vesting.release(&mint, balance, START + offset);
                    prop_assert!(vesting.released(&mint) <= total);
                }

                let balance = total - vesting.released(&mint);
                let _ = vesting.release(&mint, balance, START + 100 * DAY);
                prop_assert_eq!(vesting.released(&mint), total);
            }
        }
    }
}
