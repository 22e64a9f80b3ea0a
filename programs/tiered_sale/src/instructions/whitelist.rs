/**
 * Whitelist Instructions
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;

use crate::{
    state::Whitelist,
    SaleError,
    WHITELIST_SEED,
    WhitelistInitialized,
    WhitelistAdminChanged,
    ActorAdmitted,
    ActorRevoked,
};

// =============================================================================
// INITIALIZE WHITELIST
// =============================================================================

#[derive(Accounts)]
pub struct InitializeWhitelist<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        init,
        payer = owner,
        space = Whitelist::LEN,
        seeds = [WHITELIST_SEED, owner.key().as_ref()],
        bump,
    )]
    pub whitelist: Account<'info, Whitelist>,

    pub system_program: Program<'info, System>,
}

pub fn init_handler(ctx: Context<InitializeWhitelist>) -> Result<()> {
    let whitelist = &mut ctx.accounts.whitelist;
    whitelist.initialize(ctx.accounts.owner.key(), ctx.bumps.whitelist);

    emit!(WhitelistInitialized {
        whitelist: whitelist.key(),
        owner: whitelist.owner,
    });

    Ok(())
}

// =============================================================================
// SET ADMIN
// =============================================================================

#[derive(Accounts)]
pub struct SetWhitelistAdmin<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [WHITELIST_SEED, whitelist.owner.as_ref()],
        bump = whitelist.bump,
        has_one = owner @ SaleError::Unauthorized,
    )]
    pub whitelist: Account<'info, Whitelist>,
}

pub fn set_admin_handler(ctx: Context<SetWhitelistAdmin>, admin: Pubkey) -> Result<()> {
    let whitelist = &mut ctx.accounts.whitelist;
    whitelist.set_admin(&ctx.accounts.owner.key(), admin)?;

    emit!(WhitelistAdminChanged {
        whitelist: whitelist.key(),
        admin,
    });

    Ok(())
}

// =============================================================================
// ADMIT / REVOKE
// =============================================================================

#[derive(Accounts)]
pub struct ManageWhitelist<'info> {
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [WHITELIST_SEED, whitelist.owner.as_ref()],
        bump = whitelist.bump,
    )]
    pub whitelist: Account<'info, Whitelist>,
}

pub fn admit_handler(ctx: Context<ManageWhitelist>, actor: Pubkey, tier: u8) -> Result<()> {
    let whitelist = &mut ctx.accounts.whitelist;
    whitelist.admit(&ctx.accounts.admin.key(), actor, tier)?;

    msg!("Admitted {} at tier {} ({} total)", actor, tier, whitelist.count());

    emit!(ActorAdmitted {
        whitelist: whitelist.key(),
        actor,
        tier,
        count: whitelist.count(),
    });

    Ok(())
}

pub fn revoke_handler(ctx: Context<ManageWhitelist>, actor: Pubkey) -> Result<()> {
    let whitelist = &mut ctx.accounts.whitelist;
    let tier = whitelist.revoke(&ctx.accounts.admin.key(), &actor)?;

    msg!("Revoked {} ({} remaining)", actor, whitelist.count());

    emit!(ActorRevoked {
        whitelist: whitelist.key(),
        actor,
        tier,
        count: whitelist.count(),
    });

    Ok(())
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Accounts)]
pub struct ViewWhitelist<'info> {
    #[account(
        seeds = [WHITELIST_SEED, whitelist.owner.as_ref()],
        bump = whitelist.bump,
    )]
    pub whitelist: Account<'info, Whitelist>,
}

pub fn address_at_handler(ctx: Context<ViewWhitelist>, index: u32) -> Result<Pubkey> {
    ctx.accounts.whitelist.address_at(index)
}

pub fn tier_of_handler(ctx: Context<ViewWhitelist>, actor: Pubkey) -> Result<Option<u8>> {
    Ok(ctx.accounts.whitelist.tier_of(&actor))
}

pub fn is_admitted_handler(ctx: Context<ViewWhitelist>, actor: Pubkey) -> Result<bool> {
    Ok(ctx.accounts.whitelist.is_admitted(&actor))
}

pub fn count_handler(ctx: Context<ViewWhitelist>) -> Result<u32> {
    Ok(ctx.accounts.whitelist.count())
}
