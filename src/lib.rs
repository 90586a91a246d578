//! Fleet Incentive & Scorecard Calculation Engine
//!
//! This crate calculates monthly driver incentives (kilometre incentive, fuel
//! efficiency bonus, operator-defined formulas) and scores employee KPI
//! scorecards against weighted targets. Every calculation is a pure function
//! of its inputs and carries an audit trace explaining each decision.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod telemetry;
