//! Ledger port. The SQLite adapter lives in moneykeeper-infra.

pub mod repository;
