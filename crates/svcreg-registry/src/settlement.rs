//! # Token Settlement
//!
//! Entry points for the fungible-token rail: storage registration, transfer
//! notifications, withdrawals, slashed-fund drains and the callback that
//! resolves outbound transfers.

use svcreg_core::{AccountId, Balance, Currency};
use svcreg_ledger::{DepositMemo, Payout, TransferId, TransferOutcome};

use crate::context::CallContext;
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::registry::ServiceRegistry;

impl ServiceRegistry {
    /// Register `account` (the caller when `None`) to hold `token` deposits.
    /// Returns `false` if it was already registered.
    pub fn storage_deposit(
        &mut self,
        ctx: &CallContext,
        account: Option<AccountId>,
        token: &AccountId,
    ) -> Result<bool, RegistryError> {
        self.atomically(|reg| {
            let account = account.unwrap_or_else(|| ctx.predecessor.clone());
            let added = reg.gateway.register(token, &account);
            tracing::debug!(%token, %account, added, "storage registration");
            Ok(added)
        })
    }

    /// Unregister the caller from `token`. The deposit balance must be empty.
    pub fn storage_withdraw(&mut self, ctx: &CallContext, token: &AccountId) -> Result<(), RegistryError> {
        self.atomically(|reg| {
            reg.gateway.unregister(token, &ctx.predecessor)?;
            tracing::debug!(%token, account = %ctx.predecessor, "storage unregistered");
            Ok(())
        })
    }

    /// Handle a transfer notification from token contract `ctx.predecessor`.
    ///
    /// `msg` is empty for an unscoped deposit or `{"service_id": N}` to
    /// earmark it for a service settled in this token. Returns the amount the
    /// token contract must give back to `sender`: zero on acceptance, the
    /// whole amount when the memo is unusable or the sender is unregistered.
    pub fn ft_on_transfer(
        &mut self,
        ctx: &CallContext,
        sender: &AccountId,
        amount: Balance,
        msg: &str,
    ) -> Result<Balance, RegistryError> {
        self.atomically(|reg| {
            let token = ctx.predecessor.clone();
            let scope = match DepositMemo::parse(msg) {
                Ok(memo) => memo.map(|m| m.service_id),
                Err(err) => {
                    tracing::warn!(%token, %sender, amount, error = %err, "unreadable transfer memo; returning deposit");
                    return Ok(amount);
                }
            };
            if let Some(service_id) = scope {
                let settles_in_token = reg
                    .store
                    .get(service_id)
                    .map(|s| s.currency == Currency::Token(token.clone()))
                    .unwrap_or(false);
                if !settles_in_token {
                    tracing::warn!(%token, %sender, %service_id, amount, "deposit scoped to a service not settled in this token; returning deposit");
                    return Ok(amount);
                }
            }

            let unused = reg.gateway.deposit(&token, sender, scope, amount);
            if unused == 0 {
                reg.emit(RegistryEvent::TokenDeposit {
                    token,
                    sender: sender.clone(),
                    amount,
                    service_id: scope,
                });
            }
            Ok(unused)
        })
    }

    /// Pay the caller's whole `token` deposit balance back to them.
    pub fn withdraw(&mut self, ctx: &CallContext, token: &AccountId) -> Result<Payout, RegistryError> {
        self.atomically(|reg| {
            let payout = reg.gateway.withdraw(token, &ctx.predecessor)?;
            tracing::info!(%token, account = %ctx.predecessor, amount = payout.amount(), "deposit withdrawn");
            reg.emit(RegistryEvent::Withdraw {
                account: ctx.predecessor.clone(),
                token: token.clone(),
                amount: payout.amount(),
            });
            Ok(payout)
        })
    }

    /// Send all slashed funds of `currency` to the registry owner.
    pub fn drain(&mut self, ctx: &CallContext, currency: &Currency) -> Result<Payout, RegistryError> {
        self.atomically(|reg| {
            reg.require_registry_owner(&ctx.predecessor)?;
            let receiver = reg.owner.clone();
            let payout = reg.gateway.drain(currency, &receiver)?;
            tracing::info!(%currency, %receiver, amount = payout.amount(), "slashed funds drained");
            reg.emit(RegistryEvent::Drain {
                receiver,
                currency: currency.clone(),
                amount: payout.amount(),
            });
            Ok(payout)
        })
    }

    /// Apply the token contract's answer to pending transfer `id`.
    ///
    /// Only the registry account may call this. A failed transfer is
    /// compensated and the compensation is kept, then `TokenTransferFailed`
    /// is returned.
    pub fn resolve_transfer(
        &mut self,
        ctx: &CallContext,
        id: TransferId,
        outcome: TransferOutcome,
    ) -> Result<(), RegistryError> {
        let transfer = self.atomically(|reg| {
            if ctx.predecessor != reg.account {
                return Err(RegistryError::Unauthorized {
                    caller: ctx.predecessor.clone(),
                    required: "registry account",
                });
            }
            let transfer = reg.gateway.resolve(id, outcome)?;
            reg.emit(RegistryEvent::TransferResolved { id, outcome });
            Ok(transfer)
        })?;

        match outcome {
            TransferOutcome::Succeeded => {
                tracing::info!(%id, receiver = %transfer.receiver, amount = transfer.amount, "token transfer settled");
                Ok(())
            }
            TransferOutcome::Failed => Err(RegistryError::TokenTransferFailed {
                id,
                token: transfer.token,
                receiver: transfer.receiver,
                amount: transfer.amount,
            }),
        }
    }
}
