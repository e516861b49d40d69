//! HTTP request handlers.

pub mod complaints;
pub mod dto;
pub mod health;
pub mod orders;
pub mod payments;
pub mod prescriptions;
