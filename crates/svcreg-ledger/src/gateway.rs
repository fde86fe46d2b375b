//! # Token Gateway
//!
//! Moves value in and out of the registry in either currency.
//!
//! - **Native** payments are attached to the call that needs them and must
//!   match the requirement exactly. Native payouts settle immediately.
//! - **Fungible tokens** arrive ahead of time through transfer notifications
//!   and sit in per-account deposit balances until an operation consumes
//!   them. A deposit may be scoped to one service through the transfer memo.
//!   Outbound token payouts are debited first and recorded as
//!   [`PendingTransfer`]s; the token contract's answer is applied later with
//!   [`TokenGateway::resolve`], which re-credits on failure.
//!
//! Held value is split into *holdings* (stakes, bonds and slashed funds
//! locked by the registry) and *accounts* (deposited or claimable balances
//! owned by users). Slashed funds are a sub-part of holdings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use svcreg_core::{AccountId, Balance, Currency, ServiceId};

use crate::error::LedgerError;

// ── Identifiers ────────────────────────────────────────────────────────

/// Identifier of an outbound token transfer awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(u64);

impl TransferId {
    /// Wrap a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transfer:{}", self.0)
    }
}

// ── Deposit Memo ───────────────────────────────────────────────────────

/// Parsed `msg` of a token transfer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositMemo {
    /// Service the deposit is earmarked for.
    pub service_id: ServiceId,
}

impl DepositMemo {
    /// Empty or whitespace memo means an unscoped deposit. Anything else must
    /// be `{"service_id": <id>}`.
    pub fn parse(msg: &str) -> Result<Option<Self>, serde_json::Error> {
        if msg.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(msg).map(Some)
    }
}

// ── Accounts ───────────────────────────────────────────────────────────

/// Deposited token balance of one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    /// Balance usable for any service.
    pub unscoped: Balance,
    /// Balances earmarked for a single service.
    pub scoped: BTreeMap<ServiceId, Balance>,
}

impl TokenAccount {
    /// Everything the account could withdraw.
    pub fn total(&self) -> Balance {
        self.scoped
            .values()
            .fold(self.unscoped, |acc, b| acc.saturating_add(*b))
    }

    /// Balance usable for `service_id`.
    pub fn available_for(&self, service_id: ServiceId) -> Balance {
        self.unscoped
            .saturating_add(self.scoped.get(&service_id).copied().unwrap_or(0))
    }

    fn credit(&mut self, scope: Option<ServiceId>, amount: Balance) {
        match scope {
            Some(id) => {
                let b = self.scoped.entry(id).or_default();
                *b = b.saturating_add(amount);
            }
            None => self.unscoped = self.unscoped.saturating_add(amount),
        }
    }

    /// Consume `amount`, scoped balance first. Caller checked availability.
    fn consume(&mut self, service_id: ServiceId, amount: Balance) {
        let mut rest = amount;
        if let Some(b) = self.scoped.get_mut(&service_id) {
            let take = rest.min(*b);
            *b -= take;
            rest -= take;
            if *b == 0 {
                self.scoped.remove(&service_id);
            }
        }
        self.unscoped = self.unscoped.saturating_sub(rest);
    }
}

// ── Pending Transfers ──────────────────────────────────────────────────

/// Why value is leaving the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferPurpose {
    /// Bond returned to an operator.
    Unbond {
        /// Service the bond belonged to.
        service_id: ServiceId,
    },
    /// Deposit balance withdrawn by its owner.
    Withdraw,
    /// Slashed funds sent to the registry owner.
    Drain,
}

/// An outbound token transfer that has been debited but not confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    /// Transfer id.
    pub id: TransferId,
    /// Token contract.
    pub token: AccountId,
    /// Recipient.
    pub receiver: AccountId,
    /// Amount debited.
    pub amount: Balance,
    /// Reason for the payout; decides the compensation on failure.
    pub purpose: TransferPurpose,
}

/// Answer from the token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    /// Tokens reached the receiver.
    Succeeded,
    /// The transfer was rejected; the registry still holds the tokens.
    Failed,
}

/// How a payout settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payout {
    /// Native currency sent in the same call.
    Settled {
        /// Recipient.
        receiver: AccountId,
        /// Amount sent.
        amount: Balance,
    },
    /// Token transfer awaiting confirmation.
    Pending {
        /// Id to resolve later.
        id: TransferId,
        /// Amount debited.
        amount: Balance,
    },
}

impl Payout {
    /// Amount paid or debited.
    pub fn amount(&self) -> Balance {
        match self {
            Self::Settled { amount, .. } | Self::Pending { amount, .. } => *amount,
        }
    }
}

// ── Gateway ────────────────────────────────────────────────────────────

/// Native and token balances held by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGateway {
    native_balance: Balance,
    token_holdings: BTreeMap<AccountId, Balance>,
    accounts: BTreeMap<AccountId, BTreeMap<AccountId, TokenAccount>>,
    native_slashed: Balance,
    token_slashed: BTreeMap<AccountId, Balance>,
    pending: BTreeMap<TransferId, PendingTransfer>,
    next_transfer_id: u64,
}

impl TokenGateway {
    /// Empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ───────────────────────────────────────────────────

    /// Open a zero deposit balance for `account` in `token`. Returns whether
    /// the account was newly registered.
    pub fn register(&mut self, token: &AccountId, account: &AccountId) -> bool {
        let balances = self.accounts.entry(token.clone()).or_default();
        if balances.contains_key(account) {
            return false;
        }
        balances.insert(account.clone(), TokenAccount::default());
        true
    }

    /// Close an empty deposit balance.
    pub fn unregister(&mut self, token: &AccountId, account: &AccountId) -> Result<(), LedgerError> {
        let balance = self.account(token, account)?.total();
        if balance > 0 {
            return Err(LedgerError::BalanceNotEmpty {
                token: token.clone(),
                account: account.clone(),
                balance,
            });
        }
        if let Some(balances) = self.accounts.get_mut(token) {
            balances.remove(account);
        }
        Ok(())
    }

    /// Whether `account` has opted in to `token`.
    pub fn is_registered(&self, token: &AccountId, account: &AccountId) -> bool {
        self.accounts
            .get(token)
            .is_some_and(|b| b.contains_key(account))
    }

    fn account(&self, token: &AccountId, account: &AccountId) -> Result<&TokenAccount, LedgerError> {
        self.accounts
            .get(token)
            .and_then(|b| b.get(account))
            .ok_or_else(|| LedgerError::AccountNotRegistered {
                token: token.clone(),
                account: account.clone(),
            })
    }

    fn account_mut(
        &mut self,
        token: &AccountId,
        account: &AccountId,
    ) -> Result<&mut TokenAccount, LedgerError> {
        self.accounts
            .get_mut(token)
            .and_then(|b| b.get_mut(account))
            .ok_or_else(|| LedgerError::AccountNotRegistered {
                token: token.clone(),
                account: account.clone(),
            })
    }

    // ── Inbound ────────────────────────────────────────────────────────

    /// Credit a confirmed token transfer to the sender's deposit balance.
    ///
    /// Returns the amount the token contract should hand back to the sender:
    /// zero when accepted, everything when the sender is not registered.
    pub fn deposit(
        &mut self,
        token: &AccountId,
        sender: &AccountId,
        scope: Option<ServiceId>,
        amount: Balance,
    ) -> Balance {
        match self.account_mut(token, sender) {
            Ok(account) => {
                account.credit(scope, amount);
                0
            }
            Err(_) => {
                tracing::warn!(%token, %sender, amount, "token deposit from unregistered account returned");
                amount
            }
        }
    }

    /// Take `required` from the payer for `service_id` and lock it in the
    /// registry's holdings.
    ///
    /// Native: `attached` must equal `required`. Token: nothing may be
    /// attached and the payer's deposits (scoped first, then unscoped) must
    /// cover `required`.
    pub fn collect(
        &mut self,
        currency: &Currency,
        payer: &AccountId,
        service_id: ServiceId,
        attached: Balance,
        required: Balance,
    ) -> Result<(), LedgerError> {
        match currency {
            Currency::Native => {
                if attached != required {
                    return Err(LedgerError::DepositMismatch {
                        expected: required,
                        attached,
                    });
                }
                self.native_balance = self
                    .native_balance
                    .checked_add(required)
                    .ok_or(LedgerError::Overflow)?;
            }
            Currency::Token(token) => {
                if attached != 0 {
                    return Err(LedgerError::DepositMismatch {
                        expected: 0,
                        attached,
                    });
                }
                let holdings = self
                    .token_holdings
                    .get(token)
                    .copied()
                    .unwrap_or(0)
                    .checked_add(required)
                    .ok_or(LedgerError::Overflow)?;
                let account = self.account_mut(token, payer)?;
                let available = account.available_for(service_id);
                if available < required {
                    return Err(LedgerError::InsufficientDeposit {
                        required,
                        available,
                    });
                }
                account.consume(service_id, required);
                self.token_holdings.insert(token.clone(), holdings);
            }
        }
        Ok(())
    }

    // ── Outbound ───────────────────────────────────────────────────────

    fn debit_holdings(&mut self, currency: &Currency, amount: Balance) -> Result<(), LedgerError> {
        let held = match currency {
            Currency::Native => &mut self.native_balance,
            Currency::Token(token) => self.token_holdings.entry(token.clone()).or_default(),
        };
        if *held < amount {
            return Err(LedgerError::InsufficientHoldings {
                currency: currency.clone(),
                required: amount,
                available: *held,
            });
        }
        *held -= amount;
        Ok(())
    }

    fn credit_holdings(&mut self, currency: &Currency, amount: Balance) {
        let held = match currency {
            Currency::Native => &mut self.native_balance,
            Currency::Token(token) => self.token_holdings.entry(token.clone()).or_default(),
        };
        *held = held.saturating_add(amount);
    }

    fn enqueue(
        &mut self,
        token: &AccountId,
        receiver: &AccountId,
        amount: Balance,
        purpose: TransferPurpose,
    ) -> Payout {
        self.next_transfer_id += 1;
        let id = TransferId(self.next_transfer_id);
        self.pending.insert(
            id,
            PendingTransfer {
                id,
                token: token.clone(),
                receiver: receiver.clone(),
                amount,
                purpose,
            },
        );
        Payout::Pending { id, amount }
    }

    /// Release `amount` from holdings to `receiver` as an unbond payout.
    pub fn pay_out(
        &mut self,
        currency: &Currency,
        receiver: &AccountId,
        service_id: ServiceId,
        amount: Balance,
    ) -> Result<Payout, LedgerError> {
        self.debit_holdings(currency, amount)?;
        Ok(match currency {
            Currency::Native => Payout::Settled {
                receiver: receiver.clone(),
                amount,
            },
            Currency::Token(token) => {
                self.enqueue(token, receiver, amount, TransferPurpose::Unbond { service_id })
            }
        })
    }

    /// Move `amount` from holdings into `receiver`'s claimable balance for
    /// `service_id`. Native refunds settle immediately instead.
    pub fn refund(
        &mut self,
        currency: &Currency,
        receiver: &AccountId,
        service_id: ServiceId,
        amount: Balance,
    ) -> Result<Payout, LedgerError> {
        match currency {
            Currency::Native => {
                self.debit_holdings(currency, amount)?;
                Ok(Payout::Settled {
                    receiver: receiver.clone(),
                    amount,
                })
            }
            Currency::Token(token) => {
                self.debit_holdings(currency, amount)?;
                self.register(token, receiver);
                self.account_mut(token, receiver)?
                    .credit(Some(service_id), amount);
                Ok(Payout::Settled {
                    receiver: receiver.clone(),
                    amount,
                })
            }
        }
    }

    /// Send the caller's whole deposit balance of `token` back to them.
    pub fn withdraw(&mut self, token: &AccountId, account: &AccountId) -> Result<Payout, LedgerError> {
        let entry = self.account_mut(token, account)?;
        let amount = entry.total();
        if amount == 0 {
            return Err(LedgerError::NothingToPayOut {
                currency: Currency::Token(token.clone()),
            });
        }
        *entry = TokenAccount::default();
        Ok(self.enqueue(token, account, amount, TransferPurpose::Withdraw))
    }

    fn slashed_pot(&mut self, currency: &Currency) -> &mut Balance {
        match currency {
            Currency::Native => &mut self.native_slashed,
            Currency::Token(token) => self.token_slashed.entry(token.clone()).or_default(),
        }
    }

    /// Add slashed bond to the slashed-funds pot. The value stays in holdings.
    pub fn record_slash(&mut self, currency: &Currency, amount: Balance) {
        let pot = self.slashed_pot(currency);
        *pot = pot.saturating_add(amount);
    }

    /// Send all slashed funds of `currency` to `receiver`.
    pub fn drain(&mut self, currency: &Currency, receiver: &AccountId) -> Result<Payout, LedgerError> {
        let amount = self.slashed(currency);
        if amount == 0 {
            return Err(LedgerError::NothingToPayOut {
                currency: currency.clone(),
            });
        }
        self.debit_holdings(currency, amount)?;
        *self.slashed_pot(currency) = 0;
        Ok(match currency {
            Currency::Native => Payout::Settled {
                receiver: receiver.clone(),
                amount,
            },
            Currency::Token(token) => self.enqueue(token, receiver, amount, TransferPurpose::Drain),
        })
    }

    /// Apply the token contract's answer to a pending transfer.
    ///
    /// On failure the debited amount is credited back: to the receiver's
    /// deposit balance for unbond and withdraw payouts (scoped to the service
    /// for unbond), to the slashed-funds pot for drains.
    pub fn resolve(
        &mut self,
        id: TransferId,
        outcome: TransferOutcome,
    ) -> Result<PendingTransfer, LedgerError> {
        let transfer = self
            .pending
            .remove(&id)
            .ok_or(LedgerError::UnknownTransfer { id })?;
        if outcome == TransferOutcome::Failed {
            match transfer.purpose {
                TransferPurpose::Unbond { service_id } => {
                    self.register(&transfer.token, &transfer.receiver);
                    self.account_mut(&transfer.token, &transfer.receiver)?
                        .credit(Some(service_id), transfer.amount);
                }
                TransferPurpose::Withdraw => {
                    self.register(&transfer.token, &transfer.receiver);
                    self.account_mut(&transfer.token, &transfer.receiver)?
                        .credit(None, transfer.amount);
                }
                TransferPurpose::Drain => {
                    let currency = Currency::Token(transfer.token.clone());
                    self.credit_holdings(&currency, transfer.amount);
                    self.record_slash(&currency, transfer.amount);
                }
            }
            tracing::warn!(
                id = %transfer.id,
                token = %transfer.token,
                receiver = %transfer.receiver,
                amount = transfer.amount,
                "token transfer failed; amount re-credited"
            );
        }
        Ok(transfer)
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Native currency held by the registry.
    pub fn native_balance(&self) -> Balance {
        self.native_balance
    }

    /// Locked holdings of `token`.
    pub fn token_holdings(&self, token: &AccountId) -> Balance {
        self.token_holdings.get(token).copied().unwrap_or(0)
    }

    /// Total deposit balance of an account, `None` when not registered.
    pub fn balance_of(&self, token: &AccountId, account: &AccountId) -> Option<Balance> {
        self.accounts
            .get(token)
            .and_then(|b| b.get(account))
            .map(TokenAccount::total)
    }

    /// Deposit balance usable for one service.
    pub fn available_for(&self, token: &AccountId, account: &AccountId, service_id: ServiceId) -> Balance {
        self.accounts
            .get(token)
            .and_then(|b| b.get(account))
            .map_or(0, |a| a.available_for(service_id))
    }

    /// Slashed funds awaiting drain.
    pub fn slashed(&self, currency: &Currency) -> Balance {
        match currency {
            Currency::Native => self.native_slashed,
            Currency::Token(token) => self.token_slashed.get(token).copied().unwrap_or(0),
        }
    }

    /// Unresolved outbound transfers.
    pub fn pending(&self) -> impl Iterator<Item = &PendingTransfer> {
        self.pending.values()
    }

    /// One unresolved transfer.
    pub fn pending_transfer(&self, id: TransferId) -> Option<&PendingTransfer> {
        self.pending.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn sid(n: u32) -> ServiceId {
        ServiceId::new(n).unwrap()
    }

    fn usdc() -> Currency {
        Currency::Token(acct("usdc.near"))
    }

    #[test]
    fn memo_parsing() {
        assert_eq!(DepositMemo::parse("").unwrap(), None);
        assert_eq!(
            DepositMemo::parse(r#"{"service_id": 3}"#).unwrap(),
            Some(DepositMemo { service_id: sid(3) })
        );
        assert!(DepositMemo::parse("hello").is_err());
        assert!(DepositMemo::parse(r#"{"service_id": 0}"#).is_err());
    }

    #[test]
    fn native_collect_requires_exact_amount() {
        let mut g = TokenGateway::new();
        let payer = acct("owner.near");
        assert_eq!(
            g.collect(&Currency::Native, &payer, sid(1), 999, 1000),
            Err(LedgerError::DepositMismatch {
                expected: 1000,
                attached: 999
            })
        );
        assert_eq!(
            g.collect(&Currency::Native, &payer, sid(1), 1001, 1000),
            Err(LedgerError::DepositMismatch {
                expected: 1000,
                attached: 1001
            })
        );
        g.collect(&Currency::Native, &payer, sid(1), 1000, 1000).unwrap();
        assert_eq!(g.native_balance(), 1000);
    }

    #[test]
    fn unregistered_deposit_is_returned() {
        let mut g = TokenGateway::new();
        let token = acct("usdc.near");
        assert_eq!(g.deposit(&token, &acct("op.near"), None, 50), 50);
        assert_eq!(g.balance_of(&token, &acct("op.near")), None);
    }

    #[test]
    fn token_collect_uses_scoped_then_unscoped() {
        let mut g = TokenGateway::new();
        let token = acct("usdc.near");
        let op = acct("op.near");
        assert!(g.register(&token, &op));
        assert!(!g.register(&token, &op));

        assert_eq!(
            g.collect(&usdc(), &op, sid(1), 0, 100),
            Err(LedgerError::InsufficientDeposit {
                required: 100,
                available: 0
            })
        );

        assert_eq!(g.deposit(&token, &op, Some(sid(1)), 60), 0);
        assert_eq!(g.deposit(&token, &op, Some(sid(2)), 500), 0);
        assert_eq!(g.deposit(&token, &op, None, 50), 0);
        assert_eq!(g.available_for(&token, &op, sid(1)), 110);

        g.collect(&usdc(), &op, sid(1), 0, 100).unwrap();
        assert_eq!(g.token_holdings(&token), 100);
        assert_eq!(g.available_for(&token, &op, sid(1)), 10);
        assert_eq!(g.available_for(&token, &op, sid(2)), 510);
        assert_eq!(g.balance_of(&token, &op), Some(510));
    }

    #[test]
    fn token_collect_rejects_attached_native() {
        let mut g = TokenGateway::new();
        let op = acct("op.near");
        g.register(&acct("usdc.near"), &op);
        assert!(matches!(
            g.collect(&usdc(), &op, sid(1), 5, 0),
            Err(LedgerError::DepositMismatch { expected: 0, attached: 5 })
        ));
    }

    #[test]
    fn token_payout_is_pending_until_resolved() {
        let mut g = TokenGateway::new();
        let token = acct("usdc.near");
        let op = acct("op.near");
        g.register(&token, &op);
        g.deposit(&token, &op, None, 100);
        g.collect(&usdc(), &op, sid(1), 0, 100).unwrap();

        let payout = g.pay_out(&usdc(), &op, sid(1), 100).unwrap();
        let Payout::Pending { id, amount } = payout else {
            panic!("expected pending payout, got: {payout:?}");
        };
        assert_eq!(amount, 100);
        assert_eq!(g.token_holdings(&token), 0);
        assert_eq!(g.pending().count(), 1);

        let t = g.resolve(id, TransferOutcome::Failed).unwrap();
        assert_eq!(t.receiver, op);
        assert_eq!(g.available_for(&token, &op, sid(1)), 100);
        assert_eq!(g.pending().count(), 0);

        assert_eq!(
            g.resolve(id, TransferOutcome::Succeeded),
            Err(LedgerError::UnknownTransfer { id })
        );
    }

    #[test]
    fn native_payout_settles() {
        let mut g = TokenGateway::new();
        let op = acct("op.near");
        g.collect(&Currency::Native, &op, sid(1), 10, 10).unwrap();
        let payout = g.pay_out(&Currency::Native, &op, sid(1), 10).unwrap();
        assert_eq!(payout, Payout::Settled { receiver: op.clone(), amount: 10 });
        assert_eq!(g.native_balance(), 0);
        assert!(matches!(
            g.pay_out(&Currency::Native, &op, sid(1), 1),
            Err(LedgerError::InsufficientHoldings { .. })
        ));
    }

    #[test]
    fn withdraw_and_failed_withdraw() {
        let mut g = TokenGateway::new();
        let token = acct("usdc.near");
        let op = acct("op.near");
        g.register(&token, &op);
        assert!(matches!(
            g.withdraw(&token, &op),
            Err(LedgerError::NothingToPayOut { .. })
        ));
        g.deposit(&token, &op, Some(sid(4)), 30);
        g.deposit(&token, &op, None, 20);
        let Payout::Pending { id, amount } = g.withdraw(&token, &op).unwrap() else {
            panic!("expected pending withdrawal");
        };
        assert_eq!(amount, 50);
        assert_eq!(g.balance_of(&token, &op), Some(0));
        g.resolve(id, TransferOutcome::Failed).unwrap();
        assert_eq!(g.balance_of(&token, &op), Some(50));
    }

    #[test]
    fn drain_slashed_token_funds() {
        let mut g = TokenGateway::new();
        let token = acct("usdc.near");
        let op = acct("op.near");
        let owner = acct("owner.near");
        g.register(&token, &op);
        g.deposit(&token, &op, None, 100);
        g.collect(&usdc(), &op, sid(1), 0, 100).unwrap();
        g.record_slash(&usdc(), 40);

        let Payout::Pending { id, amount } = g.drain(&usdc(), &owner).unwrap() else {
            panic!("expected pending drain");
        };
        assert_eq!(amount, 40);
        assert_eq!(g.slashed(&usdc()), 0);
        assert_eq!(g.token_holdings(&token), 60);

        g.resolve(id, TransferOutcome::Failed).unwrap();
        assert_eq!(g.slashed(&usdc()), 40);
        assert_eq!(g.token_holdings(&token), 100);
    }

    #[test]
    fn unregister_requires_zero_balance() {
        let mut g = TokenGateway::new();
        let token = acct("usdc.near");
        let op = acct("op.near");
        assert!(matches!(
            g.unregister(&token, &op),
            Err(LedgerError::AccountNotRegistered { .. })
        ));
        g.register(&token, &op);
        g.deposit(&token, &op, None, 1);
        assert!(matches!(
            g.unregister(&token, &op),
            Err(LedgerError::BalanceNotEmpty { balance: 1, .. })
        ));
    }

    #[test]
    fn refund_token_credits_claimable() {
        let mut g = TokenGateway::new();
        let token = acct("usdc.near");
        let owner = acct("owner.near");
        g.register(&token, &owner);
        g.deposit(&token, &owner, None, 100);
        g.collect(&usdc(), &owner, sid(1), 0, 100).unwrap();
        g.refund(&usdc(), &owner, sid(1), 100).unwrap();
        assert_eq!(g.token_holdings(&token), 0);
        assert_eq!(g.available_for(&token, &owner, sid(1)), 100);
    }
}
