/**
 * Vesting Instructions
 *
 * Release is permissionless and always pays the schedule's beneficiary.
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
    state::{LinearVesting, Sale},
    SaleError,
    VESTING_SEED,
    TokensReleased,
};

// =============================================================================
// RELEASE
// =============================================================================

#[derive(Accounts)]
pub struct Release<'info> {
    /// Anyone can release; tokens only ever go to the beneficiary
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        mut,
        seeds = [VESTING_SEED, vesting.registry.as_ref(), vesting.beneficiary.as_ref()],
        bump = vesting.bump,
    )]
    pub vesting: Box<Account<'info, LinearVesting>>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = vesting,
        associated_token::token_program = token_program,
    )]
    pub vesting_vault: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Matched against vesting.beneficiary
    #[account(address = vesting.beneficiary)]
    pub beneficiary: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = payer,
        associated_token::mint = mint,
        associated_token::authority = beneficiary,
        associated_token::token_program = token_program,
    )]
    pub beneficiary_token_account: InterfaceAccount<'info, TokenAccount>,

    /// Sale that minted this token; required to thaw a frozen beneficiary
    #[account(mut, has_one = mint @ SaleError::TokenMismatch)]
    pub sale: Option<Box<Account<'info, Sale>>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn release_handler(ctx: Context<Release>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let mint_key = ctx.accounts.mint.key();
    let balance = ctx.accounts.vesting_vault.amount;

    if let Some(sale) = ctx.accounts.sale.as_mut() {
        let token_program = ctx.accounts.token_program.to_account_info();
        let mint = ctx.accounts.mint.to_account_info();
        thaw_as_sale(sale, &token_program, &mint, &ctx.accounts.vesting_vault)?;
        thaw_as_sale(sale, &token_program, &mint, &ctx.accounts.beneficiary_token_account)?;
    }

    let vesting = &mut ctx.accounts.vesting;
    let amount = vesting.release(&mint_key, balance, now)?;
    let total_released = vesting.released(&mint_key);

    let seeds: &[&[u8]] = &[
        VESTING_SEED,
        vesting.registry.as_ref(),
        vesting.beneficiary.as_ref(),
        &[vesting.bump],
    ];

    token_interface::transfer_checked(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.vesting_vault.to_account_info(),
                mint: ctx.accounts.mint.to_account_info(),
                to: ctx.accounts.beneficiary_token_account.to_account_info(),
                authority: vesting.to_account_info(),
            },
            &[seeds],
        ),
        amount,
        ctx.accounts.mint.decimals,
    )?;

    msg!("Released {} ({} total) to {}", amount, total_released, vesting.beneficiary);

    emit!(TokensReleased {
        vesting: vesting.key(),
        beneficiary: vesting.beneficiary,
        mint: mint_key,
        amount,
        total_released,
    });

    Ok(())
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Accounts)]
pub struct ViewVesting<'info> {
    #[account(
        seeds = [VESTING_SEED, vesting.registry.as_ref(), vesting.beneficiary.as_ref()],
        bump = vesting.bump,
    )]
    pub vesting: Box<Account<'info, LinearVesting>>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        associated_token::mint = mint,
        associated_token::authority = vesting,
        associated_token::token_program = token_program,
    )]
    pub vesting_vault: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn releasable_handler(ctx: Context<ViewVesting>) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.vesting.releasable_amount(
        &ctx.accounts.mint.key(),
        ctx.accounts.vesting_vault.amount,
        now,
    )
}
