//! Bodegón API library.
//!
//! REST backend for a small liquor store: token-authenticated users manage
//! their own products and place orders against them. Prices are snapshotted
//! onto order items when an order is placed, and every order is written in a
//! single transaction.
//!
//! This crate provides the API as a library so that the binary, the CLI and
//! the HTTP tests share one router and one set of services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;
