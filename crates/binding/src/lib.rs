//! Contract bindings for the capped, owner-mintable ERC20 token.
//!
//! Generated with alloy's `sol!` macro; every amount argument and return value
//! is an integer scaled by `decimals()`.

pub mod token;
