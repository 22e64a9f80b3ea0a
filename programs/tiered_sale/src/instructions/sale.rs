/**
 * Sale Setup Instructions
 *
 * Opening the sale window and the owner's tuning knobs.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token_interface::Mint;

use crate::{
    state::{Contribution, Sale, SaleAddress, SaleConfig, SaleParams, Whitelist},
    SaleError,
    CONTRIBUTION_SEED,
    SALE_CONFIG_SEED,
    SALE_SEED,
    WHITELIST_SEED,
    SaleInitialized,
    SaleCapsUpdated,
    WalletChanged,
    SaleAddressSet,
};

// =============================================================================
// INITIALIZE SALE
// =============================================================================

#[derive(Accounts)]
pub struct InitializeSale<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        seeds = [SALE_CONFIG_SEED, mint.key().as_ref()],
        bump = config.bump,
        constraint = config.authority == owner.key() @ SaleError::Unauthorized,
    )]
    pub config: Account<'info, SaleConfig>,

    #[account(
        seeds = [WHITELIST_SEED, whitelist.owner.as_ref()],
        bump = whitelist.bump,
    )]
    pub whitelist: Account<'info, Whitelist>,

    /// CHECK: Only receives lamports
    pub wallet: UncheckedAccount<'info>,

    #[account(
        init,
        payer = owner,
        space = Sale::LEN,
        seeds = [SALE_SEED, mint.key().as_ref()],
        bump,
    )]
    pub sale: Account<'info, Sale>,

    pub system_program: Program<'info, System>,
}

pub fn init_handler(ctx: Context<InitializeSale>, params: SaleParams) -> Result<()> {
    let sale_key = ctx.accounts.sale.key();
    let mint = &ctx.accounts.mint;

    // Sale PDA mints during the sale and freezes buyer accounts until finalize
    require!(
        mint.mint_authority == COption::Some(sale_key),
        SaleError::InvalidMintAuthority
    );
    require!(
        mint.freeze_authority == COption::Some(sale_key),
        SaleError::InvalidMintAuthority
    );

    let sale = &mut ctx.accounts.sale;
    sale.initialize(
        ctx.accounts.owner.key(),
        ctx.accounts.config.key(),
        ctx.accounts.whitelist.key(),
        mint.key(),
        ctx.accounts.wallet.key(),
        &params,
        ctx.bumps.sale,
    )?;

    msg!(
        "Sale opened: {} -> {}, rounds of {}s",
        sale.start_time,
        sale.end_time,
        sale.round_duration
    );

    emit!(SaleInitialized {
        sale: sale_key,
        mint: sale.mint,
        start_time: sale.start_time,
        end_time: sale.end_time,
        round_duration: sale.round_duration,
    });

    Ok(())
}

// =============================================================================
// OWNER SETTERS
// =============================================================================

#[derive(Accounts)]
pub struct UpdateSale<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [SALE_SEED, sale.mint.as_ref()],
        bump = sale.bump,
    )]
    pub sale: Account<'info, Sale>,
}

fn emit_caps(sale: &Account<Sale>) {
    emit!(SaleCapsUpdated {
        sale: sale.key(),
        base_cap: sale.base_cap,
        max_cap: sale.max_cap,
        round_duration: sale.round_duration,
    });
}

pub fn set_base_cap_handler(ctx: Context<UpdateSale>, base_cap: u64) -> Result<()> {
    let sale = &mut ctx.accounts.sale;
    sale.set_base_cap(&ctx.accounts.owner.key(), base_cap)?;
    emit_caps(sale);
    Ok(())
}

pub fn set_max_cap_handler(ctx: Context<UpdateSale>, max_cap: u64) -> Result<()> {
    let sale = &mut ctx.accounts.sale;
    sale.set_max_cap(&ctx.accounts.owner.key(), max_cap)?;
    emit_caps(sale);
    Ok(())
}

pub fn set_round_duration_handler(ctx: Context<UpdateSale>, round_duration: i64) -> Result<()> {
    let sale = &mut ctx.accounts.sale;
    sale.set_round_duration(&ctx.accounts.owner.key(), round_duration)?;
    emit_caps(sale);
    Ok(())
}

pub fn change_wallet_handler(ctx: Context<UpdateSale>, wallet: Pubkey) -> Result<()> {
    let sale = &mut ctx.accounts.sale;
    let old_wallet = sale.change_wallet(&ctx.accounts.owner.key(), wallet)?;

    emit!(WalletChanged {
        sale: sale.key(),
        old_wallet,
        new_wallet: wallet,
    });

    Ok(())
}

pub fn set_address_handler(
    ctx: Context<UpdateSale>,
    field: SaleAddress,
    address: Pubkey,
) -> Result<()> {
    let sale = &mut ctx.accounts.sale;
    sale.set_address(&ctx.accounts.owner.key(), field, address)?;

    msg!("{:?} set to {}", field, address);

    emit!(SaleAddressSet {
        sale: sale.key(),
        field,
        address,
    });

    Ok(())
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Accounts)]
pub struct ViewSale<'info> {
    #[account(
        seeds = [SALE_SEED, sale.mint.as_ref()],
        bump = sale.bump,
    )]
    pub sale: Account<'info, Sale>,

    #[account(address = sale.config)]
    pub config: Account<'info, SaleConfig>,
}

pub fn current_round_handler(ctx: Context<ViewSale>) -> Result<u8> {
    let now = Clock::get()?.unix_timestamp;
    Ok(ctx.accounts.sale.current_round(&ctx.accounts.config, now))
}

pub fn current_cap_handler(ctx: Context<ViewSale>, tier: u8) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    Ok(ctx.accounts.sale.individual_cap(&ctx.accounts.config, tier, now))
}

pub fn is_cap_reached_handler(ctx: Context<ViewSale>) -> Result<bool> {
    Ok(ctx.accounts.sale.is_cap_reached(&ctx.accounts.config))
}

pub fn has_ended_handler(ctx: Context<ViewSale>) -> Result<bool> {
    let now = Clock::get()?.unix_timestamp;
    Ok(ctx.accounts.sale.has_ended(&ctx.accounts.config, now))
}

#[derive(Accounts)]
#[instruction(beneficiary: Pubkey)]
pub struct ViewAvailableCap<'info> {
    #[account(
        seeds = [SALE_SEED, sale.mint.as_ref()],
        bump = sale.bump,
    )]
    pub sale: Account<'info, Sale>,

    #[account(address = sale.config)]
    pub config: Account<'info, SaleConfig>,

    #[account(address = sale.whitelist)]
    pub whitelist: Account<'info, Whitelist>,

    /// Absent until the beneficiary's first purchase
    #[account(
        seeds = [CONTRIBUTION_SEED, sale.key().as_ref(), beneficiary.as_ref()],
        bump = contribution.bump,
    )]
    pub contribution: Option<Account<'info, Contribution>>,
}

/// Lamports `beneficiary` may still contribute in the current round
pub fn available_cap_handler(ctx: Context<ViewAvailableCap>, beneficiary: Pubkey) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let Some(tier) = ctx.accounts.whitelist.tier_of(&beneficiary) else {
        return Ok(0);
    };
    let contributed = ctx
        .accounts
        .contribution
        .as_ref()
        .map_or(0, |contribution| contribution.amount);

    Ok(ctx
        .accounts
        .sale
        .available_cap(&ctx.accounts.config, tier, contributed, now))
}
