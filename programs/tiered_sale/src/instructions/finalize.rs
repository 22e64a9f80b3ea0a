/**
 * Finalize Instructions
 *
 * FINALIZE:
 * - unsold public supply + reserve value -> reserve fund
 * - bounty / development values -> their funds
 * - presale / team / advisors supplies -> registry vaults
 * - mint authority retired (supply is final)
 * - transfer pause lifted
 *
 * Holders are thawed one account at a time afterwards (permissionless).
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_2022::spl_token_2022::instruction::AuthorityType;
use anchor_spl::token_interface::{
    self, Mint, MintTo, SetAuthority, ThawAccount, TokenAccount, TokenInterface,
};

use crate::{
    state::{AllocationRegistry, Sale, SaleConfig},
    SaleError,
    SALE_SEED,
    SaleFinalized,
    HolderThawed,
    LedgerOwnershipTransferred,
};

// =============================================================================
// FINALIZE
// =============================================================================

#[derive(Accounts)]
pub struct Finalize<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [SALE_SEED, mint.key().as_ref()],
        bump = sale.bump,
        has_one = mint @ SaleError::TokenMismatch,
        has_one = config,
    )]
    pub sale: Box<Account<'info, Sale>>,

    pub config: Box<Account<'info, SaleConfig>>,

    #[account(mut)]
    pub mint: Box<InterfaceAccount<'info, Mint>>,

    // ─────────────────────────────────────────────────────────────────────────
    // ALLOCATION REGISTRIES
    // ─────────────────────────────────────────────────────────────────────────

    #[account(
        address = sale.presale_allocations @ SaleError::AddressesNotSet,
        constraint = presale_allocations.mint == mint.key() @ SaleError::TokenMismatch,
    )]
    pub presale_allocations: Box<Account<'info, AllocationRegistry>>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = presale_allocations,
        associated_token::token_program = token_program,
    )]
    pub presale_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        address = sale.team_allocations @ SaleError::AddressesNotSet,
        constraint = team_allocations.mint == mint.key() @ SaleError::TokenMismatch,
    )]
    pub team_allocations: Box<Account<'info, AllocationRegistry>>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = team_allocations,
        associated_token::token_program = token_program,
    )]
    pub team_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        address = sale.advisors_allocations @ SaleError::AddressesNotSet,
        constraint = advisors_allocations.mint == mint.key() @ SaleError::TokenMismatch,
    )]
    pub advisors_allocations: Box<Account<'info, AllocationRegistry>>,

    #[account(
        mut,
        associated_token::mint = mint,
        associated_token::authority = advisors_allocations,
        associated_token::token_program = token_program,
    )]
    pub advisors_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    // ─────────────────────────────────────────────────────────────────────────
    // FUNDS
    // ─────────────────────────────────────────────────────────────────────────

    /// CHECK: Matched against sale.reserve_fund
    #[account(address = sale.reserve_fund @ SaleError::AddressesNotSet)]
    pub reserve_fund: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = reserve_fund,
        associated_token::token_program = token_program,
    )]
    pub reserve_fund_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: Matched against sale.bounty_fund
    #[account(address = sale.bounty_fund @ SaleError::AddressesNotSet)]
    pub bounty_fund: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = bounty_fund,
        associated_token::token_program = token_program,
    )]
    pub bounty_fund_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: Matched against sale.development_fund
    #[account(address = sale.development_fund @ SaleError::AddressesNotSet)]
    pub development_fund: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = owner,
        associated_token::mint = mint,
        associated_token::authority = development_fund,
        associated_token::token_program = token_program,
    )]
    pub development_fund_token_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Thaw a token account frozen by the sale. Only possible once transfers
/// are unpaused; returns whether anything was thawed.
pub fn thaw_as_sale<'info>(
    sale: &mut Account<'info, Sale>,
    token_program: &AccountInfo<'info>,
    mint: &AccountInfo<'info>,
    holder: &InterfaceAccount<'info, TokenAccount>,
) -> Result<bool> {
    if !holder.is_frozen() {
        return Ok(false);
    }
    sale.note_thawed()?;

    let mint_key = sale.mint;
    let seeds: &[&[u8]] = &[SALE_SEED, mint_key.as_ref(), &[sale.bump]];

    token_interface::thaw_account(CpiContext::new_with_signer(
        token_program.clone(),
        ThawAccount {
            account: holder.to_account_info(),
            mint: mint.clone(),
            authority: sale.to_account_info(),
        },
        &[seeds],
    ))?;

    Ok(true)
}

/// Mint into an account signed by the sale PDA, thawing it first if a
/// buyer account doubles as a fund
fn mint_as_sale<'info>(
    sale: &mut Account<'info, Sale>,
    token_program: &AccountInfo<'info>,
    mint: &AccountInfo<'info>,
    to: &InterfaceAccount<'info, TokenAccount>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    thaw_as_sale(sale, token_program, mint, to)?;

    let mint_key = sale.mint;
    let seeds: &[&[u8]] = &[SALE_SEED, mint_key.as_ref(), &[sale.bump]];

    token_interface::mint_to(
        CpiContext::new_with_signer(
            token_program.clone(),
            MintTo {
                mint: mint.clone(),
                to: to.to_account_info(),
                authority: sale.to_account_info(),
            },
            &[seeds],
        ),
        amount,
    )
}

pub fn finalize_handler(mut ctx: Context<Finalize>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    let accounts = &mut ctx.accounts;
    let amounts = accounts
        .sale
        .finalize(&accounts.owner.key(), &accounts.config, now)?;
    let sale_key = accounts.sale.key();
    let raised = accounts.sale.raised;
    let tokens_sold = accounts.sale.tokens_sold;

    let token_program = accounts.token_program.to_account_info();
    let mint = accounts.mint.to_account_info();

    let targets = [
        (&accounts.reserve_fund_token_account, amounts.reserve),
        (&accounts.bounty_fund_token_account, amounts.bounty),
        (&accounts.development_fund_token_account, amounts.development),
        (&accounts.presale_vault, amounts.presale),
        (&accounts.team_vault, amounts.team),
        (&accounts.advisors_vault, amounts.advisors),
    ];
    for (to, amount) in targets {
        mint_as_sale(&mut accounts.sale, &token_program, &mint, to, amount)?;
    }

    // No further minting once the sale is closed
    let mint_key = accounts.mint.key();
    let seeds: &[&[u8]] = &[SALE_SEED, mint_key.as_ref(), &[accounts.sale.bump]];
    token_interface::set_authority(
        CpiContext::new_with_signer(
            token_program,
            SetAuthority {
                current_authority: accounts.sale.to_account_info(),
                account_or_mint: mint,
            },
            &[seeds],
        ),
        AuthorityType::MintTokens,
        None,
    )?;

    msg!("╔══════════════════════════════════════════════════════════════╗");
    msg!("║                      SALE FINALIZED                          ║");
    msg!("╠══════════════════════════════════════════════════════════════╣");
    msg!("║ Raised:       {} lamports", raised);
    msg!("║ Sold:         {}", tokens_sold);
    msg!("║ Unsold:       {} (to reserve)", amounts.unsold);
    msg!("║ Reserve:      {}", amounts.reserve);
    msg!("║ Bounty:       {}", amounts.bounty);
    msg!("║ Development:  {}", amounts.development);
    msg!("║ Allocations:  {} / {} / {}", amounts.presale, amounts.team, amounts.advisors);
    msg!("║ Still frozen: {} holder accounts", accounts.sale.frozen_holders);
    msg!("╚══════════════════════════════════════════════════════════════╝");

    emit!(SaleFinalized {
        sale: sale_key,
        raised,
        tokens_sold,
        unsold: amounts.unsold,
        reserve_minted: amounts.reserve,
        bounty_minted: amounts.bounty,
        development_minted: amounts.development,
    });

    Ok(())
}

// =============================================================================
// THAW HOLDER
// =============================================================================

#[derive(Accounts)]
pub struct ThawHolder<'info> {
    #[account(
        mut,
        seeds = [SALE_SEED, mint.key().as_ref()],
        bump = sale.bump,
        has_one = mint @ SaleError::TokenMismatch,
    )]
    pub sale: Account<'info, Sale>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        token::mint = mint,
        token::token_program = token_program,
    )]
    pub holder_token_account: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn thaw_holder_handler(mut ctx: Context<ThawHolder>) -> Result<()> {
    let accounts = &mut ctx.accounts;
    accounts.sale.require_unpaused()?;

    let holder = &accounts.holder_token_account;
    let thawed = thaw_as_sale(
        &mut accounts.sale,
        &accounts.token_program.to_account_info(),
        &accounts.mint.to_account_info(),
        holder,
    )?;
    if !thawed {
        msg!("{} is not frozen", holder.key());
        return Ok(());
    }

    emit!(HolderThawed {
        sale: accounts.sale.key(),
        token_account: holder.key(),
    });

    Ok(())
}

// =============================================================================
// TRANSFER LEDGER OWNERSHIP
// =============================================================================

#[derive(Accounts)]
pub struct TransferLedgerOwnership<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [SALE_SEED, mint.key().as_ref()],
        bump = sale.bump,
        has_one = mint @ SaleError::TokenMismatch,
    )]
    pub sale: Account<'info, Sale>,

    #[account(mut)]
    pub mint: InterfaceAccount<'info, Mint>,

    pub token_program: Interface<'info, TokenInterface>,
}

/// Refused while any holder the sale froze is still frozen, since the
/// sale can no longer thaw once the owner holds the freeze authority
pub fn transfer_ledger_ownership_handler(ctx: Context<TransferLedgerOwnership>) -> Result<()> {
    let sale = &ctx.accounts.sale;
    let owner = ctx.accounts.owner.key();
    sale.require_ledger_handoff(&owner)?;

    let mint_key = ctx.accounts.mint.key();
    let seeds: &[&[u8]] = &[SALE_SEED, mint_key.as_ref(), &[sale.bump]];

    token_interface::set_authority(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            SetAuthority {
                current_authority: sale.to_account_info(),
                account_or_mint: ctx.accounts.mint.to_account_info(),
            },
            &[seeds],
        ),
        AuthorityType::FreezeAccount,
        Some(owner),
    )?;

    emit!(LedgerOwnershipTransferred {
        mint: mint_key,
        new_owner: owner,
    });

    Ok(())
}
