#![doc = "book-sync-core: core logic library for book-sync."]

//! This crate contains the content pipeline that mirrors a book's chapters and
//! code samples from a git repository into a static-site content directory.
//!
//! # Usage
//! Build a [`config::SyncConfig`], pick a [`contract::SourceFetcher`]
//! (normally [`download::GitFetcher`]) and call [`synchronise::run_pipeline`].

pub mod classify;
pub mod config;
pub mod contract;
pub mod download;
pub mod pages;
pub mod preprocess;
pub mod synchronise;
