//! The pancli client library.
//!
//! This crate provides the core functionality for the pancli command-line
//! client for the Baidu Netdisk REST API, including credential storage,
//! request signing, API interactions and download delegation.
//!
//! # Modules
//!
//! - `client`: Netdisk API client (user info, directory listing, download
//!   link resolution)
//! - `commands`: CLI command definitions
//! - `credentials`: Session token storage
//! - `downloader`: Hand-off to an external download manager
//! - `model`: Data models for Netdisk entities (users, directory entries,
//!   download locations)
//! - `sign`: Request signature schemes

pub mod client;
pub mod commands;
pub mod credentials;
pub mod downloader;
pub mod model;
pub mod sign;
