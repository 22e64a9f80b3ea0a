/**
 * Allocation Registry State
 *
 * Pre-committed payouts (presale, team, advisors). Each entry carries an
 * immediate principal and an optional vested portion. Distribution is
 * one-shot: the entry stays behind as a zeroed tombstone.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;

use crate::{SaleError, MAX_ALLOCATIONS, MAX_ALLOCATION_VALUE};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AllocationKind {
    Presale = 0,
    Team = 1,
    Advisors = 2,
}

impl Default for AllocationKind {
    fn default() -> Self {
        Self::Presale
    }
}

impl AllocationKind {
    /// PDA seed component
    pub fn seed(&self) -> &'static [u8] {
        match self {
            Self::Presale => b"presale",
            Self::Team => b"team",
            Self::Advisors => b"advisors",
        }
    }
}

/// Terms of an allocation, as registered and as reported by `get_allocation`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct AllocationTerms {
    /// Paid out directly on distribution
    pub principal: u64,
    /// Locked in a linear vesting schedule on distribution
    pub vested_amount: u64,
    /// Seconds after distribution before anything vests
    pub cliff: i64,
    /// Seconds over which the vested amount ramps
    pub duration: i64,
}

impl AllocationTerms {
    pub fn total(&self) -> Result<u64> {
        self.principal
            .checked_add(self.vested_amount)
            .ok_or_else(|| error!(SaleError::MathOverflow))
    }

    pub fn validate(&self) -> Result<()> {
        require!(self.principal > 0, SaleError::ZeroPrincipal);
        require!(
            self.total()? <= MAX_ALLOCATION_VALUE,
            SaleError::AllocationValueExceeded
        );
        require!(
            self.vested_amount == 0 || self.duration > 0,
            SaleError::MissingVestingDuration
        );
        require!(
            self.cliff >= 0 && self.duration >= 0 && self.cliff <= self.duration,
            SaleError::InvalidVestingTerms
        );
        Ok(())
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct AllocationEntry {
    pub actor: Pubkey,
    pub terms: AllocationTerms,
    pub distributed: bool,
    /// Vesting schedule created on distribution (default if none)
    pub vesting: Pubkey,
}

impl AllocationEntry {
    pub const LEN: usize = 32 + // actor
        8 + 8 + 8 + 8 + // terms
        1 +  // distributed
        32;  // vesting
}

/// Allocation registry account
#[account]
#[derive(Default)]
pub struct AllocationRegistry {
    /// Owner who distributes and reclaims
    pub owner: Pubkey,

    /// Admin who registers and removes allocations
    pub admin: Pubkey,

    /// Token paid out; zero until `set_token`
    pub mint: Pubkey,

    pub kind: AllocationKind,

    /// Σ(principal + vested_amount) over undistributed entries
    pub total_allocated: u64,

    /// Entries in enumeration order (swap-removed)
    pub entries: Vec<AllocationEntry>,

    /// Bump seed for PDA
    pub bump: u8,
}

impl AllocationRegistry {
    pub const LEN: usize = 8 + // discriminator
        32 + // owner
        32 + // admin
        32 + // mint
        1 +  // kind
        8 +  // total_allocated
        4 + MAX_ALLOCATIONS * AllocationEntry::LEN + // entries
        1;   // bump

    pub fn initialize(&mut self, owner: Pubkey, kind: AllocationKind, bump: u8) {
        self.owner = owner;
        self.admin = Pubkey::default();
        self.mint = Pubkey::default();
        self.kind = kind;
        self.total_allocated = 0;
        self.entries = Vec::new();
        self.bump = bump;
    }

    pub fn set_admin(&mut self, caller: &Pubkey, admin: Pubkey) -> Result<()> {
        self.require_owner(caller)?;
        require!(admin != Pubkey::default(), SaleError::NullAddress);
        self.admin = admin;
        Ok(())
    }

    pub fn set_token(&mut self, caller: &Pubkey, mint: Pubkey) -> Result<()> {
        self.require_owner(caller)?;
        require!(mint != Pubkey::default(), SaleError::NullAddress);
        self.mint = mint;
        Ok(())
    }

    /// Register or overwrite an allocation; total_allocated moves by the delta
    pub fn register(&mut self, caller: &Pubkey, actor: Pubkey, terms: AllocationTerms) -> Result<()> {
        self.require_admin(caller)?;
        require!(actor != Pubkey::default(), SaleError::NullAddress);
        terms.validate()?;

        let amount = terms.total()?;
        match self.position(&actor) {
            Some(index) => {
                let entry = &self.entries[index];
                require!(!entry.distributed, SaleError::AlreadyDistributed);

                let total = self
                    .total_allocated
                    .checked_sub(entry.terms.total()?)
                    .and_then(|total| total.checked_add(amount))
                    .ok_or(SaleError::MathOverflow)?;

                self.entries[index].terms = terms;
                self.total_allocated = total;
            }
            None => {
                require!(self.entries.len() < MAX_ALLOCATIONS, SaleError::AllocationsFull);
                let total = self
                    .total_allocated
                    .checked_add(amount)
                    .ok_or(SaleError::MathOverflow)?;

                self.entries.push(AllocationEntry {
                    actor,
                    terms,
                    distributed: false,
                    vesting: Pubkey::default(),
                });
                self.total_allocated = total;
            }
        }

        Ok(())
    }

    pub fn remove(&mut self, caller: &Pubkey, actor: &Pubkey) -> Result<()> {
        self.require_admin(caller)?;

        let index = self
            .position(actor)
            .ok_or_else(|| error!(SaleError::NoAllocation))?;
        require!(!self.entries[index].distributed, SaleError::AlreadyDistributed);

        let total = self
            .total_allocated
            .checked_sub(self.entries[index].terms.total()?)
            .ok_or(SaleError::MathOverflow)?;

        self.entries.swap_remove(index);
        self.total_allocated = total;
        Ok(())
    }

    /// Terms awaiting distribution for an actor, or the reason there are none
    pub fn pending(&self, actor: &Pubkey) -> Result<AllocationTerms> {
        require!(*actor != Pubkey::default(), SaleError::NullAddress);

        let entry = self
            .entries
            .iter()
            .find(|entry| entry.actor == *actor)
            .ok_or_else(|| error!(SaleError::NoAllocation))?;
        require!(!entry.distributed, SaleError::AlreadyDistributed);

        Ok(entry.terms)
    }

    /// Mark an allocation paid out and return its terms.
    /// `vesting` is the schedule holding the vested portion, if any.
    pub fn distribute(&mut self, caller: &Pubkey, actor: &Pubkey, vesting: Pubkey) -> Result<AllocationTerms> {
        self.require_owner(caller)?;
        let terms = self.pending(actor)?;

        let total = self
            .total_allocated
            .checked_sub(terms.total()?)
            .ok_or(SaleError::MathOverflow)?;

        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.actor == *actor) {
            entry.terms = AllocationTerms::default();
            entry.distributed = true;
            entry.vesting = vesting;
        }
        self.total_allocated = total;

        Ok(terms)
    }

    /// Distribute an allocation with no vested portion
    pub fn distribute_principal(&mut self, caller: &Pubkey, actor: &Pubkey) -> Result<AllocationTerms> {
        self.require_owner(caller)?;
        self.require_token()?;
        require!(
            self.pending(actor)?.vested_amount == 0,
            SaleError::VestedAllocation
        );
        self.distribute(caller, actor, Pubkey::default())
    }

    /// Distribute an allocation whose vested portion goes to `vesting`
    pub fn distribute_vested(
        &mut self,
        caller: &Pubkey,
        actor: &Pubkey,
        vesting: Pubkey,
    ) -> Result<AllocationTerms> {
        self.require_owner(caller)?;
        self.require_token()?;
        require!(
            self.pending(actor)?.vested_amount > 0,
            SaleError::NoVestedAmount
        );
        self.distribute(caller, actor, vesting)
    }

    /// Amount the owner may sweep out of a vault holding `vault_balance`
    pub fn reclaimable(&self, caller: &Pubkey, vault_balance: u64) -> Result<u64> {
        self.require_owner(caller)?;
        self.require_token()?;
        require!(vault_balance > 0, SaleError::NothingToReclaim);
        Ok(vault_balance)
    }

    /// Zeroed for absent or distributed entries
    pub fn get_allocation(&self, actor: &Pubkey) -> AllocationTerms {
        self.entries
            .iter()
            .find(|entry| entry.actor == *actor && !entry.distributed)
            .map(|entry| entry.terms)
            .unwrap_or_default()
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

    /// Vesting schedule of a distributed allocation (default if none)
    pub fn vesting_of(&self, actor: &Pubkey) -> Pubkey {
        self.entries
            .iter()
            .find(|entry| entry.actor == *actor)
            .map(|entry| entry.vesting)
            .unwrap_or_default()
    }

    pub fn require_owner(&self, caller: &Pubkey) -> Result<()> {
        require!(*caller == self.owner, SaleError::Unauthorized);
        Ok(())
    }

    /// Owner may pay out once a token is bound
    pub fn require_token(&self) -> Result<()> {
        require!(self.mint != Pubkey::default(), SaleError::TokenNotSet);
        Ok(())
    }

    fn require_admin(&self, caller: &Pubkey) -> Result<()> {
        require!(
            self.admin != Pubkey::default() && *caller == self.admin,
            SaleError::Unauthorized
        );
        Ok(())
    }

    fn position(&self, actor: &Pubkey) -> Option<usize> {
        self.entries.iter().position(|entry| entry.actor == *actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use anchor_lang::error::Error;

    const DAY: i64 = 24 * 60 * 60;
    const OWNER: u8 = 1;
    const ADMIN: u8 = 2;

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

    fn terms(principal: u64, vested_amount: u64, cliff: i64, duration: i64) -> AllocationTerms {
        AllocationTerms { principal, vested_amount, cliff, duration }
    }

    fn registry() -> AllocationRegistry {
        let mut registry = AllocationRegistry::default();
        registry.initialize(key(OWNER), AllocationKind::Team, 254);
        registry.set_admin(&key(OWNER), key(ADMIN)).unwrap();
        registry
    }

    #[test]
    fn owner_setters_reject_null_and_strangers() {
        let mut registry = registry();

        expect_err(registry.set_admin(&key(9), key(3)), SaleError::Unauthorized);
        expect_err(registry.set_admin(&key(OWNER), Pubkey::default()), SaleError::NullAddress);
        expect_err(registry.set_token(&key(ADMIN), key(3)), SaleError::Unauthorized);
        expect_err(registry.set_token(&key(OWNER), Pubkey::default()), SaleError::NullAddress);
        expect_err(registry.require_token(), SaleError::TokenNotSet);

        registry.set_token(&key(OWNER), key(3)).unwrap();
        assert!(registry.require_token().is_ok());
    }

    #[test]
    fn register_validates_terms() {
        let mut registry = registry();
        let admin = key(ADMIN);

        let cases = [
            (terms(0, 10, 0, DAY), SaleError::ZeroPrincipal),
            (terms(10, 10, 0, 0), SaleError::MissingVestingDuration),
            (terms(10, 10, 2 * DAY, DAY), SaleError::InvalidVestingTerms),
            (terms(10, 0, 2 * DAY, DAY), SaleError::InvalidVestingTerms),
            (terms(MAX_ALLOCATION_VALUE, 1, 0, DAY), SaleError::AllocationValueExceeded),
        ];
        for (bad, expected) in cases {
            assert_eq!(expected.kind(), FailureKind::InvalidArgument);
            expect_err(registry.register(&admin, key(10), bad), expected);
        }

        expect_err(
            registry.register(&admin, Pubkey::default(), terms(1, 0, 0, 0)),
            SaleError::NullAddress,
        );
        expect_err(
            registry.register(&key(OWNER), key(10), terms(1, 0, 0, 0)),
            SaleError::Unauthorized,
        );
        assert_eq!(registry.count(), 0);
        assert_eq!(registry.total_allocated, 0);
    }

    #[test]
    fn reregister_applies_delta() {
        let mut registry = registry();
        let admin = key(ADMIN);

        registry.register(&admin, key(10), terms(100, 50, DAY, 4 * DAY)).unwrap();
        registry.register(&admin, key(11), terms(20, 0, 0, 0)).unwrap();
        assert_eq!(registry.total_allocated, 170);

        registry.register(&admin, key(10), terms(10, 5, 0, DAY)).unwrap();
        assert_eq!(registry.total_allocated, 35);
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.get_allocation(&key(10)), terms(10, 5, 0, DAY));
    }

    #[test]
    fn remove_swaps_and_decrements() {
        let mut registry = registry();
        let admin = key(ADMIN);
        for n in 10..13 {
            registry.register(&admin, key(n), terms(n as u64, 0, 0, 0)).unwrap();
        }

        registry.remove(&admin, &key(10)).unwrap();

        assert_eq!(registry.total_allocated, 11 + 12);
        assert_eq!(registry.address_at(0).unwrap(), key(12));
        assert_eq!(registry.address_at(1).unwrap(), key(11));
        expect_err(registry.address_at(2), SaleError::IndexOutOfRange);
        expect_err(registry.remove(&admin, &key(10)), SaleError::NoAllocation);
        assert_eq!(registry.get_allocation(&key(10)), AllocationTerms::default());
    }

    #[test]
    fn distribute_is_one_shot() {
        let mut registry = registry();
        let owner = key(OWNER);
        let vesting = key(77);
        registry
            .register(&key(ADMIN), key(10), terms(100, 50, DAY, 4 * DAY))
            .unwrap();
        registry.register(&key(ADMIN), key(11), terms(5, 0, 0, 0)).unwrap();

        expect_err(registry.distribute(&key(ADMIN), &key(10), vesting), SaleError::Unauthorized);
        expect_err(
            registry.distribute(&owner, &Pubkey::default(), vesting),
            SaleError::NullAddress,
        );
        expect_err(registry.distribute(&owner, &key(12), vesting), SaleError::NoAllocation);

        let paid = registry.distribute(&owner, &key(10), vesting).unwrap();
        assert_eq!(paid, terms(100, 50, DAY, 4 * DAY));
        assert_eq!(registry.get_allocation(&key(10)), AllocationTerms::default());
        assert_eq!(registry.vesting_of(&key(10)), vesting);
        assert_eq!(registry.total_allocated, 5);
        // tombstone stays enumerable
        assert_eq!(registry.count(), 2);

        let again = registry.distribute(&owner, &key(10), vesting).unwrap_err();
        assert_eq!(code(again), code(SaleError::AlreadyDistributed.into()));
        assert_eq!(SaleError::AlreadyDistributed.kind(), FailureKind::State);

        expect_err(
            registry.register(&key(ADMIN), key(10), terms(1, 0, 0, 0)),
            SaleError::AlreadyDistributed,
        );
        expect_err(registry.remove(&key(ADMIN), &key(10)), SaleError::AlreadyDistributed);
    }

    #[test]
    fn principal_only_distribution_has_no_vesting() {
        let mut registry = registry();
        registry.register(&key(ADMIN), key(10), terms(7, 0, 0, 0)).unwrap();

        registry
            .distribute(&key(OWNER), &key(10), Pubkey::default())
            .unwrap();

        assert_eq!(registry.vesting_of(&key(10)), Pubkey::default());
        assert_eq!(registry.total_allocated, 0);
    }

    #[test]
    fn distribution_split_matches_vested_portion() {
        let mut registry = registry();
        let owner = key(OWNER);
        registry
            .register(&key(ADMIN), key(10), terms(100, 50, DAY, 4 * DAY))
            .unwrap();
        registry.register(&key(ADMIN), key(11), terms(5, 0, 0, 0)).unwrap();

        expect_err(registry.distribute_principal(&owner, &key(11)), SaleError::TokenNotSet);
        registry.set_token(&owner, key(3)).unwrap();

        expect_err(registry.distribute_principal(&owner, &key(10)), SaleError::VestedAllocation);
        expect_err(
            registry.distribute_vested(&owner, &key(11), key(77)),
            SaleError::NoVestedAmount,
        );
        expect_err(
            registry.distribute_vested(&key(ADMIN), &key(10), key(77)),
            SaleError::Unauthorized,
        );
        assert_eq!(registry.total_allocated, 155);

        assert_eq!(registry.distribute_principal(&owner, &key(11)).unwrap(), terms(5, 0, 0, 0));
        assert_eq!(
            registry.distribute_vested(&owner, &key(10), key(77)).unwrap(),
            terms(100, 50, DAY, 4 * DAY)
        );
        assert_eq!(registry.vesting_of(&key(10)), key(77));
        assert_eq!(registry.total_allocated, 0);
        expect_err(registry.distribute_principal(&owner, &key(11)), SaleError::AlreadyDistributed);
    }

    #[test]
    fn reclaim_is_owner_only_and_needs_a_balance() {
        let mut registry = registry();

        expect_err(registry.reclaimable(&key(OWNER), 10), SaleError::TokenNotSet);
        registry.set_token(&key(OWNER), key(3)).unwrap();

        expect_err(registry.reclaimable(&key(ADMIN), 10), SaleError::Unauthorized);
        expect_err(registry.reclaimable(&key(OWNER), 0), SaleError::NothingToReclaim);
        assert_eq!(registry.reclaimable(&key(OWNER), 10).unwrap(), 10);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut registry = registry();
        for i in 0..MAX_ALLOCATIONS {
            registry
                .register(&key(ADMIN), key(i as u8 + 10), terms(1, 0, 0, 0))
                .unwrap();
        }
        expect_err(
            registry.register(&key(ADMIN), key(200), terms(1, 0, 0, 0)),
            SaleError::AllocationsFull,
        );
        // overwriting an existing entry still works when full
        registry.register(&key(ADMIN), key(10), terms(2, 0, 0, 0)).unwrap();
        assert_eq!(registry.total_allocated, MAX_ALLOCATIONS as u64 + 1);
    }
}
