//! # menu-sync
//!
//! Edit a bilingual site navigation menu and publish it durably.
//!
//! The whole menu is one JSON document keyed by language code. Clients hold
//! a copy in memory, edit it, and publish the full tree back. The server
//! checks the tree, keeps the previous file as a backup, and replaces the
//! canonical file atomically. A reader of `data/menu.json` therefore sees
//! either the old tree or the new one, never a mix.
//!
//! ```text
//! editor   load → add / update / remove → serialize
//!                                            │
//! server   POST /api/menu ──────────────────►│
//!                                            ▼
//! store    validate → backup → temp + rename → mirror (menu.html)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `MenuItem`, `MenuTree`, `ItemPatch`: the shared data model and its JSON shape |
//! | [`validate`] | Tree invariants (unique ids, non-empty languages) reported as a list of violations |
//! | [`editor`] | In-memory editing session over a loaded tree |
//! | [`store`] | Canonical file, backup, atomic replace, HTML mirror |
//! | [`render`] | Maud rendering of the menu as a `<nav>` fragment per language |
//! | [`server`] | axum endpoint exposing publish and read over HTTP |
//! | [`client`] | reqwest client for that endpoint, used by the CLI `--server` mode |
//! | [`harness`] | Environment setup and teardown around test runs |
//! | [`i18n`] | Languages, text direction, string catalog, stored UI language |
//! | [`config`] | `menu-sync.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Whole-Tree Publishes
//!
//! There is no per-item endpoint. Every publish carries the full tree and is
//! validated as a whole, so cross-language invariants such as global id
//! uniqueness are checked in one place and the file on disk is always a tree
//! that passed them.
//!
//! ## Last Write Wins
//!
//! The store takes no locks and keeps no version numbers. Two editors
//! publishing at once both succeed; whichever rename lands last is the menu.
//! Atomic replacement guarantees only that the file is never torn.
//!
//! ## Mirror Is Derived
//!
//! `menu.html` is regenerated from the tree after each publish. It is never
//! read back, and a failure to write it does not fail the publish.

pub mod client;
pub mod config;
pub mod editor;
pub mod harness;
pub mod i18n;
pub mod output;
pub mod render;
pub mod server;
pub mod store;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
