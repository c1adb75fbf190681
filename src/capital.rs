use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::ParkError;

/// The park's ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Capital {
    pub balance: i64,
    pub monthly_income: i64,
    pub monthly_expense: i64,
    pub income_this_month: i64,
    pub expense_this_month: i64,
    pub last_month_income: i64,
    pub last_month_expense: i64,
    pub bankrupt: bool,
}

impl Capital {
    pub fn new(balance: i64) -> Self {
        Self {
            balance,
            monthly_income: config::PARK_BASE_INCOME,
            monthly_expense: config::PARK_UPKEEP,
            income_this_month: 0,
            expense_this_month: 0,
            last_month_income: 0,
            last_month_expense: 0,
            bankrupt: false,
        }
    }

    pub fn add_funds(&mut self, amount: i64) {
        self.balance += amount;
        self.income_this_month += amount;
    }

    /// Spend money. Refused, with nothing changed, when the balance is short.
    pub fn deduct(&mut self, amount: i64) -> Result<(), ParkError> {
        if amount > self.balance {
            return Err(ParkError::InsufficientFunds {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.expense_this_month += amount;
        Ok(())
    }

    /// Close the month: apply base income and upkeep (upkeep may overdraw),
    /// roll the accumulators, recompute bankruptcy.
    pub fn monthly_tick(&mut self) {
        self.add_funds(self.monthly_income);
        self.balance -= self.monthly_expense;
        self.expense_this_month += self.monthly_expense;

        self.last_month_income = self.income_this_month;
        self.last_month_expense = self.expense_this_month;
        self.income_this_month = 0;
        self.expense_this_month = 0;
        self.bankrupt = self.balance < 0;
    }
}
