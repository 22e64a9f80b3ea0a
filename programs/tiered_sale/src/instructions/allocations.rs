/**
 * Allocation Registry Instructions
 *
 * Tokens are paid out of the registry vault (ATA of the registry PDA),
 * which finalize funds with the configured presale/team/advisors supply.
 *
 * When the sale account is passed along, recipient accounts it froze
 * while transfers were paused are thawed before the payout.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{
    self, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::{
    instructions::finalize::thaw_as_sale,
    state::{AllocationKind, AllocationRegistry, AllocationTerms, LinearVesting, Sale},
    SaleError,
    ALLOCATIONS_SEED,
    VESTING_SEED,
    AllocationsInitialized,
    AllocationsAdminChanged,
    AllocationsTokenSet,
    AllocationRegistered,
    AllocationRemoved,
    AllocationDistributed,
    TokensReclaimed,
    VestingCreated,
};

/// Transfer out of the registry vault, signed by the registry PDA
fn pay_out<'info>(
    token_program: &Interface<'info, TokenInterface>,
    registry: &Account<'info, AllocationRegistry>,
    mint: &InterfaceAccount<'info, Mint>,
    vault: &InterfaceAccount<'info, TokenAccount>,
    to: &InterfaceAccount<'info, TokenAccount>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let seeds: &[&[u8]] = &[
        ALLOCATIONS_SEED,
        registry.owner.as_ref(),
        registry.kind.seed(),
        &[registry.bump],
    ];

    token_interface::transfer_checked(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            TransferChecked {
                from: vault.to_account_info(),
                mint: mint.to_account_info(),
                to: to.to_account_info(),
                authority: registry.to_account_info(),
            },
            &[seeds],
        ),
        amount,
        mint.decimals,
    )
}

// =============================================================================
// INITIALIZE REGISTRY
// =============================================================================

#[derive(Accounts)]
#[instruction(kind: AllocationKind)]
pub struct InitializeAllocations<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        init,
        payer = owner,
        space = AllocationRegistry::LEN,
        seeds = [ALLOCATIONS_SEED, owner.key().as_ref(), kind.seed()],
        bump,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,

    pub system_program: Program<'info, System>,
}

pub fn init_handler(ctx: Context<InitializeAllocations>, kind: AllocationKind) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.initialize(ctx.accounts.owner.key(), kind, ctx.bumps.registry);

    emit!(AllocationsInitialized {
        registry: registry.key(),
        owner: registry.owner,
        kind,
    });

    Ok(())
}

// =============================================================================
// OWNER SETTERS
// =============================================================================

#[derive(Accounts)]
pub struct UpdateAllocations<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [ALLOCATIONS_SEED, registry.owner.as_ref(), registry.kind.seed()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,
}

pub fn set_admin_handler(ctx: Context<UpdateAllocations>, admin: Pubkey) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.set_admin(&ctx.accounts.owner.key(), admin)?;

    emit!(AllocationsAdminChanged {
        registry: registry.key(),
        admin,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct SetAllocationsToken<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [ALLOCATIONS_SEED, registry.owner.as_ref(), registry.kind.seed()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = registry,
        associated_token::token_program = token_program,
    )]
    pub vault: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn set_token_handler(ctx: Context<SetAllocationsToken>) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.set_token(&ctx.accounts.owner.key(), ctx.accounts.mint.key())?;

    emit!(AllocationsTokenSet {
        registry: registry.key(),
        mint: registry.mint,
        vault: ctx.accounts.vault.key(),
    });

    Ok(())
}

// =============================================================================
// REGISTER / REMOVE
// =============================================================================

#[derive(Accounts)]
pub struct ManageAllocations<'info> {
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [ALLOCATIONS_SEED, registry.owner.as_ref(), registry.kind.seed()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,
}

pub fn register_handler(
    ctx: Context<ManageAllocations>,
    actor: Pubkey,
    terms: AllocationTerms,
) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.register(&ctx.accounts.admin.key(), actor, terms)?;

    emit!(AllocationRegistered {
        registry: registry.key(),
        actor,
        principal: terms.principal,
        vested_amount: terms.vested_amount,
        cliff: terms.cliff,
        duration: terms.duration,
        total_allocated: registry.total_allocated,
    });

    Ok(())
}

pub fn remove_handler(ctx: Context<ManageAllocations>, actor: Pubkey) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.remove(&ctx.accounts.admin.key(), &actor)?;

    emit!(AllocationRemoved {
        registry: registry.key(),
        actor,
        total_allocated: registry.total_allocated,
    });

    Ok(())
}

// =============================================================================
// DISTRIBUTE (principal only)
// =============================================================================

#[derive(Accounts)]
pub struct DistributeAllocation<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [ALLOCATIONS_SEED, registry.owner.as_ref(), registry.kind.seed()],
        bump = registry.bump,
        has_one = mint @ SaleError::TokenMismatch,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,

    pub mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = registry,
        associated_token::token_program = token_program,
    )]
    pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Sale that minted this token; required to thaw frozen recipients
    #[account(mut, has_one = mint @ SaleError::TokenMismatch)]
    pub sale: Option<Box<Account<'info, Sale>>>,

    /// CHECK: Allocation recipient, looked up in the registry
    pub actor: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = actor,
        associated_token::token_program = token_program,
    )]
    pub actor_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn distribute_handler(ctx: Context<DistributeAllocation>) -> Result<()> {
    let owner = ctx.accounts.owner.key();
    let actor = ctx.accounts.actor.key();

    let terms = ctx.accounts.registry.distribute_principal(&owner, &actor)?;

    if let Some(sale) = ctx.accounts.sale.as_mut() {
        thaw_as_sale(
            sale,
            &ctx.accounts.token_program.to_account_info(),
            &ctx.accounts.mint.to_account_info(),
            &ctx.accounts.actor_token_account,
        )?;
    }

    pay_out(
        &ctx.accounts.token_program,
        &ctx.accounts.registry,
        &ctx.accounts.mint,
        &ctx.accounts.vault,
        &ctx.accounts.actor_token_account,
        terms.principal,
    )?;

    msg!("Distributed {} to {}", terms.principal, actor);

    emit!(AllocationDistributed {
        registry: ctx.accounts.registry.key(),
        actor,
        principal: terms.principal,
        vested_amount: 0,
        vesting: Pubkey::default(),
    });

    Ok(())
}

// =============================================================================
// DISTRIBUTE (principal + vesting schedule)
// =============================================================================

#[derive(Accounts)]
pub struct DistributeVestedAllocation<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [ALLOCATIONS_SEED, registry.owner.as_ref(), registry.kind.seed()],
        bump = registry.bump,
        has_one = mint @ SaleError::TokenMismatch,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,

    pub mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = registry,
        associated_token::token_program = token_program,
    )]
    pub vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Sale that minted this token; required to thaw frozen recipients
    #[account(mut, has_one = mint @ SaleError::TokenMismatch)]
    pub sale: Option<Box<Account<'info, Sale>>>,

    /// CHECK: Allocation recipient, looked up in the registry
    pub actor: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = actor,
        associated_token::token_program = token_program,
    )]
    pub actor_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = owner,
        space = LinearVesting::LEN,
        seeds = [VESTING_SEED, registry.key().as_ref(), actor.key().as_ref()],
        bump,
    )]
    pub vesting: Box<Account<'info, LinearVesting>>,

    // The vesting PDA address is known in advance, so its ATA may already exist
    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = vesting,
        associated_token::token_program = token_program,
    )]
    pub vesting_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn distribute_vested_handler(ctx: Context<DistributeVestedAllocation>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();
    let actor = ctx.accounts.actor.key();
    let vesting_key = ctx.accounts.vesting.key();
    let registry_key = ctx.accounts.registry.key();

    let mint_key = ctx.accounts.mint.key();

    let terms = ctx
        .accounts
        .registry
        .distribute_vested(&owner, &actor, vesting_key)?;

    let vesting = &mut ctx.accounts.vesting;
    vesting.initialize(
        actor,
        registry_key,
        mint_key,
        now,
        terms.cliff,
        terms.duration,
        ctx.bumps.vesting,
    )?;

    if let Some(sale) = ctx.accounts.sale.as_mut() {
        let token_program = ctx.accounts.token_program.to_account_info();
        let mint = ctx.accounts.mint.to_account_info();
        thaw_as_sale(sale, &token_program, &mint, &ctx.accounts.actor_token_account)?;
        thaw_as_sale(sale, &token_program, &mint, &ctx.accounts.vesting_vault)?;
    }

    pay_out(
        &ctx.accounts.token_program,
        &ctx.accounts.registry,
        &ctx.accounts.mint,
        &ctx.accounts.vault,
        &ctx.accounts.actor_token_account,
        terms.principal,
    )?;
    pay_out(
        &ctx.accounts.token_program,
        &ctx.accounts.registry,
        &ctx.accounts.mint,
        &ctx.accounts.vault,
        &ctx.accounts.vesting_vault,
        terms.vested_amount,
    )?;

    msg!(
        "Distributed {} to {}, {} vesting over {}s (cliff {}s)",
        terms.principal,
        actor,
        terms.vested_amount,
        terms.duration,
        terms.cliff
    );

    emit!(VestingCreated {
        vesting: vesting_key,
        beneficiary: actor,
        start: now,
        cliff: terms.cliff,
        duration: terms.duration,
    });

    emit!(AllocationDistributed {
        registry: registry_key,
        actor,
        principal: terms.principal,
        vested_amount: terms.vested_amount,
        vesting: vesting_key,
    });

    Ok(())
}

// =============================================================================
// RECLAIM
// =============================================================================

#[derive(Accounts)]
pub struct ReclaimTokens<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [ALLOCATIONS_SEED, registry.owner.as_ref(), registry.kind.seed()],
        bump = registry.bump,
        has_one = mint @ SaleError::TokenMismatch,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = registry,
        associated_token::token_program = token_program,
    )]
    pub vault: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        token::mint = mint,
        token::token_program = token_program,
    )]
    pub destination: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn reclaim_handler(ctx: Context<ReclaimTokens>) -> Result<()> {
    let amount = ctx
        .accounts
        .registry
        .reclaimable(&ctx.accounts.owner.key(), ctx.accounts.vault.amount)?;

    pay_out(
        &ctx.accounts.token_program,
        &ctx.accounts.registry,
        &ctx.accounts.mint,
        &ctx.accounts.vault,
        &ctx.accounts.destination,
        amount,
    )?;

    emit!(TokensReclaimed {
        registry: ctx.accounts.registry.key(),
        to: ctx.accounts.destination.key(),
        amount,
    });

    Ok(())
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Accounts)]
pub struct ViewAllocations<'info> {
    #[account(
        seeds = [ALLOCATIONS_SEED, registry.owner.as_ref(), registry.kind.seed()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, AllocationRegistry>>,
}

pub fn get_allocation_handler(ctx: Context<ViewAllocations>, actor: Pubkey) -> Result<AllocationTerms> {
    Ok(ctx.accounts.registry.get_allocation(&actor))
}

pub fn address_at_handler(ctx: Context<ViewAllocations>, index: u32) -> Result<Pubkey> {
    ctx.accounts.registry.address_at(index)
}

pub fn get_vesting_handler(ctx: Context<ViewAllocations>, actor: Pubkey) -> Result<Pubkey> {
    Ok(ctx.accounts.registry.vesting_of(&actor))
}

pub fn allocations_count_handler(ctx: Context<ViewAllocations>) -> Result<u32> {
    Ok(ctx.accounts.registry.count())
}

pub fn total_allocated_handler(ctx: Context<ViewAllocations>) -> Result<u64> {
    Ok(ctx.accounts.registry.total_allocated)
}
