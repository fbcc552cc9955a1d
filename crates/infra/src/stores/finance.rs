//! Accounts, categories, transactions, budgets and goals.
//!
//! Balances and category spend are computed on read from the stored
//! transactions, so the [`FinanceReader`] answers are never stale.

use chrono::{DateTime, Utc};

use ledgerly_alerts::FinanceReader;
use ledgerly_budgets::{Budget, BudgetId, Goal, GoalId};
use ledgerly_core::{AccountId, CategoryId, Money, TenantId};
use ledgerly_ledger::{
    Account, Category, Transaction, TransactionId, account_balance, month_category_spend,
};

use crate::tenant_store::{InMemoryTenantStore, TenantStore};

#[derive(Default)]
pub struct InMemoryFinanceStore {
    accounts: InMemoryTenantStore<AccountId, Account>,
    categories: InMemoryTenantStore<CategoryId, Category>,
    transactions: InMemoryTenantStore<TransactionId, Transaction>,
    budgets: InMemoryTenantStore<BudgetId, Budget>,
    goals: InMemoryTenantStore<GoalId, Goal>,
}

impl InMemoryFinanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_account(&self, account: Account) {
        self.accounts.upsert(account.tenant_id, account.id, account);
    }

    pub fn account(&self, tenant_id: TenantId, id: AccountId) -> Option<Account> {
        self.accounts.get(tenant_id, &id)
    }

    pub fn remove_account(&self, tenant_id: TenantId, id: AccountId) -> bool {
        self.accounts.remove(tenant_id, &id)
    }

    pub fn upsert_category(&self, category: Category) {
        self.categories
            .upsert(category.tenant_id, category.id, category);
    }

    pub fn category(&self, tenant_id: TenantId, id: CategoryId) -> Option<Category> {
        self.categories.get(tenant_id, &id)
    }

    pub fn categories(&self, tenant_id: TenantId) -> Vec<Category> {
        self.categories.list(tenant_id)
    }

    pub fn remove_category(&self, tenant_id: TenantId, id: CategoryId) -> bool {
        self.categories.remove(tenant_id, &id)
    }

    pub fn insert_transaction(&self, tx: Transaction) {
        self.transactions.upsert(tx.tenant_id, tx.id, tx);
    }

    pub fn transaction(&self, tenant_id: TenantId, id: TransactionId) -> Option<Transaction> {
        self.transactions.get(tenant_id, &id)
    }

    /// All transactions of the tenant, newest first.
    pub fn transactions(&self, tenant_id: TenantId) -> Vec<Transaction> {
        let mut txs = self.transactions.list(tenant_id);
        txs.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        txs
    }

    pub fn remove_transaction(&self, tenant_id: TenantId, id: TransactionId) -> bool {
        self.transactions.remove(tenant_id, &id)
    }

    pub fn upsert_budget(&self, budget: Budget) {
        self.budgets.upsert(budget.tenant_id, budget.id, budget);
    }

    pub fn budget(&self, tenant_id: TenantId, id: BudgetId) -> Option<Budget> {
        self.budgets.get(tenant_id, &id)
    }

    pub fn remove_budget(&self, tenant_id: TenantId, id: BudgetId) -> bool {
        self.budgets.remove(tenant_id, &id)
    }

    pub fn upsert_goal(&self, goal: Goal) {
        self.goals.upsert(goal.tenant_id, goal.id, goal);
    }

    pub fn goal(&self, tenant_id: TenantId, id: GoalId) -> Option<Goal> {
        self.goals.get(tenant_id, &id)
    }

    pub fn remove_goal(&self, tenant_id: TenantId, id: GoalId) -> bool {
        self.goals.remove(tenant_id, &id)
    }
}

impl FinanceReader for InMemoryFinanceStore {
    fn accounts(&self, tenant_id: TenantId) -> Vec<Account> {
        self.accounts.list(tenant_id)
    }

    fn account_balance(&self, tenant_id: TenantId, account_id: AccountId) -> Option<Money> {
        // Unknown account is an error to the caller, not a zero balance.
        self.accounts.get(tenant_id, &account_id)?;
        let txs = self.transactions.list(tenant_id);
        Some(account_balance(account_id, &txs))
    }

    fn month_category_spend(
        &self,
        tenant_id: TenantId,
        category_id: CategoryId,
        reference: DateTime<Utc>,
    ) -> Option<Money> {
        self.categories.get(tenant_id, &category_id)?;
        let txs = self.transactions.list(tenant_id);
        Some(month_category_spend(category_id, reference, &txs))
    }

    fn budgets(&self, tenant_id: TenantId) -> Vec<Budget> {
        self.budgets.list(tenant_id)
    }

    fn goals(&self, tenant_id: TenantId) -> Vec<Goal> {
        self.goals.list(tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_ledger::{AccountKind, TransactionKind};

    fn account(tenant_id: TenantId) -> Account {
        Account {
            id: AccountId::new(),
            tenant_id,
            name: "checking".to_string(),
            kind: AccountKind::Checking,
            created_at: Utc::now(),
        }
    }

    fn income(tenant_id: TenantId, account_id: AccountId, amount: i64) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            tenant_id,
            account_id,
            category_id: None,
            kind: TransactionKind::Income,
            amount: Money::from_minor_units(amount),
            description: "pay".to_string(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn balance_is_derived_from_transactions() {
        let store = InMemoryFinanceStore::new();
        let tenant = TenantId::new();
        let acct = account(tenant);
        let acct_id = acct.id;
        store.upsert_account(acct);

        assert_eq!(
            store.account_balance(tenant, acct_id),
            Some(Money::ZERO)
        );

        store.insert_transaction(income(tenant, acct_id, 5_000));
        assert_eq!(
            store.account_balance(tenant, acct_id),
            Some(Money::from_minor_units(5_000))
        );
    }

    #[test]
    fn unknown_account_has_no_balance() {
        let store = InMemoryFinanceStore::new();
        assert_eq!(store.account_balance(TenantId::new(), AccountId::new()), None);
    }

    #[test]
    fn transactions_of_other_tenants_do_not_leak_into_balances() {
        let store = InMemoryFinanceStore::new();
        let tenant = TenantId::new();
        let other = TenantId::new();
        let acct = account(tenant);
        let acct_id = acct.id;
        store.upsert_account(acct);

        // Same account id recorded under another tenant.
        store.insert_transaction(income(other, acct_id, 9_999));

        assert_eq!(store.account_balance(tenant, acct_id), Some(Money::ZERO));
    }

    #[test]
    fn month_spend_requires_a_known_category() {
        let store = InMemoryFinanceStore::new();
        let tenant = TenantId::new();
        assert_eq!(
            store.month_category_spend(tenant, CategoryId::new(), Utc::now()),
            None
        );
    }
}
