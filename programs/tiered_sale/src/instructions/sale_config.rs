/**
 * Sale Configuration Instructions
 *
 * The config is claimed by whoever holds the mint authority at the time.
 * That authority then moves to the sale PDA before the sale is opened.
 *
 * Made by LabsX402 for Solana
 * https://x.com/LabsX402
 */

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token_interface::Mint;

use crate::{
    state::{SaleConfig, SaleConfigParams},
    SaleError,
    SALE_CONFIG_SEED,
    SaleConfigInitialized,
};

#[derive(Accounts)]
pub struct InitializeSaleConfig<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        constraint = mint.mint_authority == COption::Some(authority.key()) @ SaleError::Unauthorized,
    )]
    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        init,
        payer = authority,
        space = SaleConfig::LEN,
        seeds = [SALE_CONFIG_SEED, mint.key().as_ref()],
        bump,
    )]
    pub config: Account<'info, SaleConfig>,

    pub system_program: Program<'info, System>,
}

pub fn init_handler(ctx: Context<InitializeSaleConfig>, params: SaleConfigParams) -> Result<()> {
    let config = &mut ctx.accounts.config;
    config.initialize(
        ctx.accounts.authority.key(),
        ctx.accounts.mint.key(),
        &params,
        ctx.bumps.config,
    )?;

    msg!(
        "Sale config: {:?}, rate {}, public supply {}",
        config.profile,
        config.rate,
        config.public_sale_supply
    );

    emit!(SaleConfigInitialized {
        mint: config.mint,
        profile: config.profile,
        rate: config.rate,
        public_sale_supply: config.public_sale_supply,
        hard_cap: config.hard_cap,
    });

    Ok(())
}
