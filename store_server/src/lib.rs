//! # Store server
//! The HTTP face of the store. It is responsible for:
//! * Authenticating customers and administrators from bearer tokens.
//! * Exposing the cart, checkout, payment session and order routes of the engine.
//! * Receiving the payment gateway's signed webhooks and handing them to the reconciler.
//! * Releasing the reservations of orders that are never paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/cashfree`: Payment notifications from Cashfree.
//! * `/api/user/...`: Cart, checkout and order routes for the authenticated customer.
//! * `/api/admin/...`: Order administration. Requires the `ADMIN` role.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
