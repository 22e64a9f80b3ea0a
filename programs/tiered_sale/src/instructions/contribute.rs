/**
 * Contribute Instruction
 *
 * Buyer pays lamports to the sale wallet and receives tokens at the
 * current round's rate and bonus. While transfers are paused the
 * beneficiary's token account is kept frozen: thaw -> mint -> freeze.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{
    self, FreezeAccount, Mint, MintTo, ThawAccount, TokenAccount, TokenInterface,
};

use crate::{
    state::{Contribution, Sale, SaleConfig, Whitelist},
    SaleError,
    CONTRIBUTION_SEED,
    SALE_SEED,
    TokensPurchased,
};

#[derive(Accounts)]
pub struct Contribute<'info> {
    #[account(mut)]
    pub purchaser: Signer<'info>,

    /// CHECK: Receives tokens; admission is checked against the whitelist
    pub beneficiary: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [SALE_SEED, mint.key().as_ref()],
        bump = sale.bump,
        has_one = mint @ SaleError::TokenMismatch,
        has_one = config,
        has_one = whitelist,
        has_one = wallet,
    )]
    pub sale: Box<Account<'info, Sale>>,

    pub config: Box<Account<'info, SaleConfig>>,

    pub whitelist: Box<Account<'info, Whitelist>>,

    #[account(mut)]
    pub mint: InterfaceAccount<'info, Mint>,

    /// CHECK: Matched against sale.wallet
    #[account(mut)]
    pub wallet: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = purchaser,
        space = Contribution::LEN,
        seeds = [CONTRIBUTION_SEED, sale.key().as_ref(), beneficiary.key().as_ref()],
        bump,
    )]
    pub contribution: Box<Account<'info, Contribution>>,

    #[account(
        init_if_needed,
        payer = purchaser,
        associated_token::mint = mint,
        associated_token::authority = beneficiary,
        associated_token::token_program = token_program,
    )]
    pub beneficiary_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Contribute>, amount: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let beneficiary = ctx.accounts.beneficiary.key();
    let sale_key = ctx.accounts.sale.key();
    let tier = ctx.accounts.whitelist.tier_of(&beneficiary);

    let contribution = &mut ctx.accounts.contribution;
    contribution.bind(sale_key, beneficiary, ctx.bumps.contribution);

    let sale = &mut ctx.accounts.sale;
    let round = sale.current_round(&ctx.accounts.config, now);
    let tokens = sale.contribute(&ctx.accounts.config, tier, contribution, amount, now)?;
    let paused = sale.transfers_paused;
    let bump = sale.bump;

    // Each frozen holder is counted once until the sale thaws it
    let was_frozen = ctx.accounts.beneficiary_token_account.is_frozen();
    if paused && !was_frozen {
        sale.note_frozen()?;
    }

    // Forward the payment
    transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.purchaser.to_account_info(),
                to: ctx.accounts.wallet.to_account_info(),
            },
        ),
        amount,
    )?;

    let mint_key = ctx.accounts.mint.key();
    let seeds: &[&[u8]] = &[SALE_SEED, mint_key.as_ref(), &[bump]];
    let signer_seeds = &[seeds];

    let token_program = ctx.accounts.token_program.to_account_info();
    let mint = ctx.accounts.mint.to_account_info();
    let holder = ctx.accounts.beneficiary_token_account.to_account_info();
    let authority = ctx.accounts.sale.to_account_info();

    if was_frozen {
        token_interface::thaw_account(CpiContext::new_with_signer(
            token_program.clone(),
            ThawAccount {
                account: holder.clone(),
                mint: mint.clone(),
                authority: authority.clone(),
            },
            signer_seeds,
        ))?;
    }

    token_interface::mint_to(
        CpiContext::new_with_signer(
            token_program.clone(),
            MintTo {
                mint: mint.clone(),
                to: holder.clone(),
                authority: authority.clone(),
            },
            signer_seeds,
        ),
        tokens,
    )?;

    if paused {
        token_interface::freeze_account(CpiContext::new_with_signer(
            token_program,
            FreezeAccount {
                account: holder,
                mint,
                authority,
            },
            signer_seeds,
        ))?;
    }

    msg!("Round {}: {} lamports -> {} tokens for {}", round, amount, tokens, beneficiary);

    emit!(TokensPurchased {
        sale: sale_key,
        purchaser: ctx.accounts.purchaser.key(),
        beneficiary,
        round,
        amount,
        tokens,
    });

    Ok(())
}
