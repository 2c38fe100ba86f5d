#![doc = "catalog-sync-core: core logic library for catalog-sync."]

//! This crate contains the synchronisation engine that mirrors a paginated catalog API
//! into a store with upsert-by-key capability. Credentials and concrete store clients live
//! in the `catalog-sync` binary crate.
//!
//! # Usage
//! Implement [`contract::CatalogSource`] and [`contract::ItemStore`] (or use
//! [`fetch::HttpCatalogSource`] for the upstream side) and call
//! [`synchronise::synchronise`].

pub mod config;
pub mod contract;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod synchronise;
pub mod verify;
pub mod write;
