/**
 * Tiered Sale
 *
 * Whitelist-gated token sale with round caps, bonus schedules,
 * pre-committed allocations and linear vesting.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 *
 * License: BSL 1.1 (converts to MIT after Dec 2028)
 */

use anchor_lang::prelude::*;

pub mod state;
pub mod instructions;

use state::*;
use instructions::*;

declare_id!("2ChCrrMHvHDLpRzx26FaWhuxHFZPtCb5pRUvZG82Bsvp");

// =============================================================================
// SEEDS
// =============================================================================

pub const WHITELIST_SEED: &[u8] = b"whitelist";
pub const SALE_CONFIG_SEED: &[u8] = b"sale_config";
pub const SALE_SEED: &[u8] = b"sale";
pub const CONTRIBUTION_SEED: &[u8] = b"contribution";
pub const ALLOCATIONS_SEED: &[u8] = b"allocations";
pub const VESTING_SEED: &[u8] = b"vesting";

// =============================================================================
// CONSTANTS
// =============================================================================

/// Lowest whitelist tier (admitted from round 1)
pub const MIN_TIER: u8 = 1;

/// Highest whitelist tier (admitted from round 3)
pub const MAX_TIER: u8 = 3;

/// Rounds in the geometric profile (caps B, 2B, 4B, max)
pub const GEOMETRIC_ROUNDS: u8 = 4;

/// Rounds in the tiered profile (one per tier)
pub const TIERED_ROUNDS: u8 = 3;

/// Bonus schedule by round, in percent
pub const DEFAULT_BONUS_BY_ROUND: [u8; 4] = [20, 10, 5, 0];

/// Percent denominator for bonus math
pub const PERCENT_DENOMINATOR: u128 = 100;

/// Largest principal + vested amount a single allocation may carry
/// (1 billion tokens at 9 decimals)
pub const MAX_ALLOCATION_VALUE: u64 = 1_000_000_000 * 1_000_000_000;

/// Whitelist capacity (bounded by account size)
pub const MAX_WHITELIST_ENTRIES: usize = 250;

/// Allocation registry capacity
pub const MAX_ALLOCATIONS: usize = 64;

/// Distinct mints a vesting schedule can track releases for
pub const MAX_VESTING_ASSETS: usize = 4;

// =============================================================================
// PROGRAM
// =============================================================================

#[program]
pub mod tiered_sale {
    use super::*;

    // =========================================================================
    // WHITELIST
    // =========================================================================

    /// Create a whitelist owned by the signer
    pub fn initialize_whitelist(ctx: Context<InitializeWhitelist>) -> Result<()> {
        instructions::whitelist::init_handler(ctx)
    }

    /// Owner appoints the whitelist admin
    pub fn set_whitelist_admin(ctx: Context<SetWhitelistAdmin>, admin: Pubkey) -> Result<()> {
        instructions::whitelist::set_admin_handler(ctx, admin)
    }

    /// Admit an actor with a tier (1-3)
    pub fn admit(ctx: Context<ManageWhitelist>, actor: Pubkey, tier: u8) -> Result<()> {
        instructions::whitelist::admit_handler(ctx, actor, tier)
    }

    /// Revoke an admitted actor
    pub fn revoke(ctx: Context<ManageWhitelist>, actor: Pubkey) -> Result<()> {
        instructions::whitelist::revoke_handler(ctx, actor)
    }

    pub fn whitelist_address_at(ctx: Context<ViewWhitelist>, index: u32) -> Result<Pubkey> {
        instructions::whitelist::address_at_handler(ctx, index)
    }

    pub fn tier_of(ctx: Context<ViewWhitelist>, actor: Pubkey) -> Result<Option<u8>> {
        instructions::whitelist::tier_of_handler(ctx, actor)
    }

    pub fn is_admitted(ctx: Context<ViewWhitelist>, actor: Pubkey) -> Result<bool> {
        instructions::whitelist::is_admitted_handler(ctx, actor)
    }

    pub fn whitelist_count(ctx: Context<ViewWhitelist>) -> Result<u32> {
        instructions::whitelist::count_handler(ctx)
    }

    // =========================================================================
    // SALE
    // =========================================================================

    /// Store the immutable sale economics for a mint
    pub fn initialize_sale_config(
        ctx: Context<InitializeSaleConfig>,
        params: SaleConfigParams,
    ) -> Result<()> {
        instructions::sale_config::init_handler(ctx, params)
    }

    /// Open a sale window
    /// The sale PDA must already be mint and freeze authority of the mint
    pub fn initialize_sale(ctx: Context<InitializeSale>, params: SaleParams) -> Result<()> {
        instructions::sale::init_handler(ctx, params)
    }

    pub fn set_base_cap(ctx: Context<UpdateSale>, base_cap: u64) -> Result<()> {
        instructions::sale::set_base_cap_handler(ctx, base_cap)
    }

    pub fn set_max_cap(ctx: Context<UpdateSale>, max_cap: u64) -> Result<()> {
        instructions::sale::set_max_cap_handler(ctx, max_cap)
    }

    pub fn set_round_duration(ctx: Context<UpdateSale>, round_duration: i64) -> Result<()> {
        instructions::sale::set_round_duration_handler(ctx, round_duration)
    }

    /// Redirect raised lamports to a new wallet
    pub fn change_wallet(ctx: Context<UpdateSale>, wallet: Pubkey) -> Result<()> {
        instructions::sale::change_wallet_handler(ctx, wallet)
    }

    pub fn set_presale_allocations(ctx: Context<UpdateSale>, registry: Pubkey) -> Result<()> {
        instructions::sale::set_address_handler(ctx, SaleAddress::PresaleAllocations, registry)
    }

    pub fn set_team_allocations(ctx: Context<UpdateSale>, registry: Pubkey) -> Result<()> {
        instructions::sale::set_address_handler(ctx, SaleAddress::TeamAllocations, registry)
    }

    pub fn set_advisors_allocations(ctx: Context<UpdateSale>, registry: Pubkey) -> Result<()> {
        instructions::sale::set_address_handler(ctx, SaleAddress::AdvisorsAllocations, registry)
    }

    pub fn set_reserve_fund(ctx: Context<UpdateSale>, fund: Pubkey) -> Result<()> {
        instructions::sale::set_address_handler(ctx, SaleAddress::ReserveFund, fund)
    }

    pub fn set_bounty_fund(ctx: Context<UpdateSale>, fund: Pubkey) -> Result<()> {
        instructions::sale::set_address_handler(ctx, SaleAddress::BountyFund, fund)
    }

    pub fn set_development_fund(ctx: Context<UpdateSale>, fund: Pubkey) -> Result<()> {
        instructions::sale::set_address_handler(ctx, SaleAddress::DevelopmentFund, fund)
    }

    pub fn current_round(ctx: Context<ViewSale>) -> Result<u8> {
        instructions::sale::current_round_handler(ctx)
    }

    /// Per-actor cap for the given tier in the current round
    pub fn current_cap(ctx: Context<ViewSale>, tier: u8) -> Result<u64> {
        instructions::sale::current_cap_handler(ctx, tier)
    }

    /// Remaining room for one beneficiary; zero if not whitelisted
    pub fn available_cap(ctx: Context<ViewAvailableCap>, beneficiary: Pubkey) -> Result<u64> {
        instructions::sale::available_cap_handler(ctx, beneficiary)
    }

    pub fn is_cap_reached(ctx: Context<ViewSale>) -> Result<bool> {
        instructions::sale::is_cap_reached_handler(ctx)
    }

    pub fn has_ended(ctx: Context<ViewSale>) -> Result<bool> {
        instructions::sale::has_ended_handler(ctx)
    }

    /// Buy tokens for a whitelisted beneficiary
    /// Lamports go to the sale wallet; tokens are minted frozen until finalize
    pub fn contribute(ctx: Context<Contribute>, amount: u64) -> Result<()> {
        instructions::contribute::handler(ctx, amount)
    }

    /// Close the sale
    /// Mints unsold + reserve, bounty, development and allocation supplies,
    /// then retires the mint authority
    pub fn finalize(ctx: Context<Finalize>) -> Result<()> {
        instructions::finalize::finalize_handler(ctx)
    }

    /// Unfreeze a holder account once the sale is finalized (permissionless)
    pub fn thaw_holder(ctx: Context<ThawHolder>) -> Result<()> {
        instructions::finalize::thaw_holder_handler(ctx)
    }

    /// Hand the mint's freeze authority to the sale owner
    pub fn transfer_ledger_ownership(ctx: Context<TransferLedgerOwnership>) -> Result<()> {
        instructions::finalize::transfer_ledger_ownership_handler(ctx)
    }

    // =========================================================================
    // ALLOCATIONS
    // =========================================================================

    pub fn initialize_allocations(
        ctx: Context<InitializeAllocations>,
        kind: AllocationKind,
    ) -> Result<()> {
        instructions::allocations::init_handler(ctx, kind)
    }

    pub fn set_allocations_admin(ctx: Context<UpdateAllocations>, admin: Pubkey) -> Result<()> {
        instructions::allocations::set_admin_handler(ctx, admin)
    }

    /// Bind the registry to a mint and create its token vault
    pub fn set_allocations_token(ctx: Context<SetAllocationsToken>) -> Result<()> {
        instructions::allocations::set_token_handler(ctx)
    }

    /// Register (or overwrite) an actor's allocation
    pub fn register_allocation(
        ctx: Context<ManageAllocations>,
        actor: Pubkey,
        principal: u64,
        vested_amount: u64,
        cliff: i64,
        duration: i64,
    ) -> Result<()> {
        instructions::allocations::register_handler(
            ctx,
            actor,
            AllocationTerms {
                principal,
                vested_amount,
                cliff,
                duration,
            },
        )
    }

    pub fn remove_allocation(ctx: Context<ManageAllocations>, actor: Pubkey) -> Result<()> {
        instructions::allocations::remove_handler(ctx, actor)
    }

    /// Pay out an allocation with no vested portion
    pub fn distribute_allocation(ctx: Context<DistributeAllocation>) -> Result<()> {
        instructions::allocations::distribute_handler(ctx)
    }

    /// Pay out the principal and lock the vested portion in a new schedule
    pub fn distribute_vested_allocation(ctx: Context<DistributeVestedAllocation>) -> Result<()> {
        instructions::allocations::distribute_vested_handler(ctx)
    }

    /// Sweep the registry vault
    pub fn reclaim_tokens(ctx: Context<ReclaimTokens>) -> Result<()> {
        instructions::allocations::reclaim_handler(ctx)
    }

    pub fn get_allocation(ctx: Context<ViewAllocations>, actor: Pubkey) -> Result<AllocationTerms> {
        instructions::allocations::get_allocation_handler(ctx, actor)
    }

    pub fn allocation_address(ctx: Context<ViewAllocations>, index: u32) -> Result<Pubkey> {
        instructions::allocations::address_at_handler(ctx, index)
    }

    pub fn get_vesting(ctx: Context<ViewAllocations>, actor: Pubkey) -> Result<Pubkey> {
        instructions::allocations::get_vesting_handler(ctx, actor)
    }

    pub fn allocations_count(ctx: Context<ViewAllocations>) -> Result<u32> {
        instructions::allocations::allocations_count_handler(ctx)
    }

    pub fn total_allocated(ctx: Context<ViewAllocations>) -> Result<u64> {
        instructions::allocations::total_allocated_handler(ctx)
    }

    // =========================================================================
    // VESTING
    // =========================================================================

    /// Release whatever has vested to the beneficiary (permissionless)
    pub fn release(ctx: Context<Release>) -> Result<()> {
        instructions::vesting::release_handler(ctx)
    }

    pub fn releasable_amount(ctx: Context<ViewVesting>) -> Result<u64> {
        instructions::vesting::releasable_handler(ctx)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failure classes surfaced to callers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Authorization,
    InvalidArgument,
    State,
    CapExceeded,
}

#[error_code]
pub enum SaleError {
    // Authorization
    #[msg("Unauthorized")]
    Unauthorized,

    // Invalid argument
    #[msg("Address must not be null")]
    NullAddress,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Tier must be 1, 2 or 3")]
    InvalidTier,

    #[msg("Cap must be non-zero and base cap must not exceed max cap")]
    InvalidCap,

    #[msg("Round duration must be positive")]
    InvalidRoundDuration,

    #[msg("Sale window is invalid (start must precede end)")]
    InvalidSaleWindow,

    #[msg("Rate must be greater than zero")]
    InvalidRate,

    #[msg("Bonus must not exceed 100%")]
    InvalidBonus,

    #[msg("Tier limits are invalid")]
    InvalidTierLimits,

    #[msg("Public sale supply must be greater than zero")]
    InvalidSupply,

    #[msg("Contribution is below the tier minimum")]
    BelowTierMinimum,

    #[msg("Principal must be greater than zero")]
    ZeroPrincipal,

    #[msg("Allocation exceeds the maximum allocation value")]
    AllocationValueExceeded,

    #[msg("Vested allocation requires a non-zero duration")]
    MissingVestingDuration,

    #[msg("Cliff must not exceed duration")]
    InvalidVestingTerms,

    #[msg("Index out of range")]
    IndexOutOfRange,

    #[msg("Sale PDA must be mint and freeze authority")]
    InvalidMintAuthority,

    #[msg("Account does not belong to this sale's mint")]
    TokenMismatch,

    #[msg("Math overflow")]
    MathOverflow,

    // State
    #[msg("Sale has not started")]
    NotStarted,

    #[msg("Sale has ended")]
    SaleEnded,

    #[msg("Already finalized")]
    AlreadyFinalized,

    #[msg("Sale has not ended and no cap is reached")]
    SaleNotEnded,

    #[msg("Allocation registries and funds must be set before finalize")]
    AddressesNotSet,

    #[msg("Sale is not finalized")]
    NotFinalized,

    #[msg("Transfers are still paused")]
    TransfersPaused,

    #[msg("Holder accounts frozen by the sale must be thawed first")]
    HoldersStillFrozen,

    #[msg("Beneficiary is not whitelisted")]
    NotWhitelisted,

    #[msg("Beneficiary tier is not admitted in this round")]
    TierNotYetAdmitted,

    #[msg("Actor is already whitelisted")]
    AlreadyAdmitted,

    #[msg("Actor is not whitelisted")]
    NotAdmitted,

    #[msg("No allocation registered for actor")]
    NoAllocation,

    #[msg("Allocation already distributed")]
    AlreadyDistributed,

    #[msg("Allocation has a vested portion; use distribute_vested_allocation")]
    VestedAllocation,

    #[msg("Allocation has no vested portion; use distribute_allocation")]
    NoVestedAmount,

    #[msg("Registry token is not set")]
    TokenNotSet,

    #[msg("Nothing to reclaim")]
    NothingToReclaim,

    #[msg("No tokens are due to be released")]
    NothingToRelease,

    // Cap exceeded
    #[msg("Contribution exceeds the individual cap for this round")]
    IndividualCapExceeded,

    #[msg("Contribution exceeds the hard cap")]
    HardCapExceeded,

    #[msg("Purchase exceeds the public sale supply")]
    SupplyCapExceeded,

    #[msg("Whitelist is full")]
    WhitelistFull,

    #[msg("Allocation registry is full")]
    AllocationsFull,

    #[msg("Vesting schedule tracks too many assets")]
    TooManyVestingAssets,
}

impl SaleError {
    pub fn kind(&self) -> FailureKind {
        use SaleError::*;
        match self {
            Unauthorized => FailureKind::Authorization,

            NullAddress | ZeroAmount | InvalidTier | InvalidCap | InvalidRoundDuration
            | InvalidSaleWindow | InvalidRate | InvalidBonus | InvalidTierLimits
            | InvalidSupply | BelowTierMinimum | ZeroPrincipal | AllocationValueExceeded
            | MissingVestingDuration | InvalidVestingTerms | IndexOutOfRange
            | InvalidMintAuthority | TokenMismatch | MathOverflow => FailureKind::InvalidArgument,

            NotStarted | SaleEnded | AlreadyFinalized | SaleNotEnded | AddressesNotSet
            | NotFinalized | TransfersPaused | HoldersStillFrozen | NotWhitelisted | TierNotYetAdmitted
            | AlreadyAdmitted | NotAdmitted | NoAllocation | AlreadyDistributed
            | VestedAllocation | NoVestedAmount | TokenNotSet | NothingToReclaim
            | NothingToRelease => FailureKind::State,

            IndividualCapExceeded | HardCapExceeded | SupplyCapExceeded | WhitelistFull
            | AllocationsFull | TooManyVestingAssets => FailureKind::CapExceeded,
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

#[event]
pub struct WhitelistInitialized {
    pub whitelist: Pubkey,
    pub owner: Pubkey,
}

#[event]
pub struct WhitelistAdminChanged {
    pub whitelist: Pubkey,
    pub admin: Pubkey,
}

#[event]
pub struct ActorAdmitted {
    pub whitelist: Pubkey,
    pub actor: Pubkey,
    pub tier: u8,
    pub count: u32,
}

#[event]
pub struct ActorRevoked {
    pub whitelist: Pubkey,
    pub actor: Pubkey,
    pub tier: u8,
    pub count: u32,
}

#[event]
pub struct SaleConfigInitialized {
    pub mint: Pubkey,
    pub profile: SaleProfile,
    pub rate: u64,
    pub public_sale_supply: u64,
    pub hard_cap: Option<u64>,
}

#[event]
pub struct SaleInitialized {
    pub sale: Pubkey,
    pub mint: Pubkey,
    pub start_time: i64,
    pub end_time: i64,
    pub round_duration: i64,
}

#[event]
pub struct SaleCapsUpdated {
    pub sale: Pubkey,
    pub base_cap: u64,
    pub max_cap: u64,
    pub round_duration: i64,
}

#[event]
pub struct WalletChanged {
    pub sale: Pubkey,
    pub old_wallet: Pubkey,
    pub new_wallet: Pubkey,
}

#[event]
pub struct SaleAddressSet {
    pub sale: Pubkey,
    pub field: SaleAddress,
    pub address: Pubkey,
}

#[event]
pub struct TokensPurchased {
    pub sale: Pubkey,
    pub purchaser: Pubkey,
    pub beneficiary: Pubkey,
    pub round: u8,
    pub amount: u64,
    pub tokens: u64,
}

#[event]
pub struct SaleFinalized {
    pub sale: Pubkey,
    pub raised: u64,
    pub tokens_sold: u64,
    pub unsold: u64,
    pub reserve_minted: u64,
    pub bounty_minted: u64,
    pub development_minted: u64,
}

#[event]
pub struct HolderThawed {
    pub sale: Pubkey,
    pub token_account: Pubkey,
}

#[event]
pub struct LedgerOwnershipTransferred {
    pub mint: Pubkey,
    pub new_owner: Pubkey,
}

#[event]
pub struct AllocationsInitialized {
    pub registry: Pubkey,
    pub owner: Pubkey,
    pub kind: AllocationKind,
}

#[event]
pub struct AllocationsAdminChanged {
    pub registry: Pubkey,
    pub admin: Pubkey,
}

#[event]
pub struct AllocationsTokenSet {
    pub registry: Pubkey,
    pub mint: Pubkey,
    pub vault: Pubkey,
}

#[event]
pub struct AllocationRegistered {
    pub registry: Pubkey,
    pub actor: Pubkey,
    pub principal: u64,
    pub vested_amount: u64,
    pub cliff: i64,
    pub duration: i64,
    pub total_allocated: u64,
}

#[event]
pub struct AllocationRemoved {
    pub registry: Pubkey,
    pub actor: Pubkey,
    pub total_allocated: u64,
}

#[event]
pub struct AllocationDistributed {
    pub registry: Pubkey,
    pub actor: Pubkey,
    pub principal: u64,
    pub vested_amount: u64,
    pub vesting: Pubkey,
}

#[event]
pub struct TokensReclaimed {
    pub registry: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
}

#[event]
pub struct VestingCreated {
    pub vesting: Pubkey,
    pub beneficiary: Pubkey,
    pub start: i64,
    pub cliff: i64,
    pub duration: i64,
}

#[event]
pub struct TokensReleased {
    pub vesting: Pubkey,
    pub beneficiary: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub total_released: u64,
}
