//! # Shop server
//! This crate hosts the HTTP server for the shop's order settlement. It is responsible for:
//! Creating payments on the Flow gateway for checkout.
//! Receiving the gateway's payment confirmations and settling the paid orders.
//! Letting the buyer's browser verify a payment, which settles the order if the confirmation has not arrived yet.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/flow/confirmation`: The gateway's server-to-server confirmation (POST), and a liveness check (GET).
//! * `/api/flow/verify`: The buyer-facing payment verification.
//! * `/api/payments`: Creates a payment on the gateway and returns the checkout URL.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
