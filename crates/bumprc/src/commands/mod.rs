//! Command implementations

pub mod bump;

pub mod release;

pub mod run;
