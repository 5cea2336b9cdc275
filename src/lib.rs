//! Per-user point balances with an append-only transaction history.
//!
//! [`commands::DomainLogic`] validates charge and use requests against an
//! [`domain::policy::AmountPolicy`], then records them through a
//! [`ports::database::LedgerStorePort`]. Operations on the same user are serialized.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;
