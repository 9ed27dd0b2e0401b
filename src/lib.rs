//! tinyssg - a tiny static site generator.
//!
//! A site is a `pages/` directory of page files. Each page unit supplies data
//! (`query`) and a template; the generator resolves every unit into one or
//! more HTML files under `dist/` and mirrors `static/` next to them. The dev
//! server rebuilds on change and serves the result with live reload.
//!
//! # Pipeline
//!
//! ```text
//! discover (pages/*.toml) → resolve (query → shape → paths) → render → translate → write (dist/)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`page`] | `PageUnit` trait, page-file loader, discovery, resolver |
//! | [`generator`] | One generation pass: collision check, staging, publish |
//! | [`actor`] | Dev-mode file watcher, debouncer and rebuild coordinator |
//! | [`cli`] | Command-line surface and the development HTTP server |
//! | [`config`] | `tinyssg.toml` loading merged with CLI flags |
//! | [`core`] | Process-wide state: shutdown signal, publish gate |
//!
//! # Writing units in Rust
//!
//! ```ignore
//! use std::sync::Arc;
//! use tinyssg::page::{PageSource, PageUnit, Query};
//!
//! struct Hello;
//!
//! impl PageUnit for Hello {
//!     fn query(&self) -> anyhow::Result<Query> {
//!         Ok(Query::new(serde_json::json!({ "name": "world" })))
//!     }
//!     fn template(&self) -> anyhow::Result<String> {
//!         Ok("<p>Hello {{ name }}</p>".into())
//!     }
//! }
//!
//! let source = PageSource::new("index").with_unit("Hello", Arc::new(|| Box::new(Hello) as Box<dyn PageUnit>));
//! ```

pub mod actor;
pub mod cli;
pub mod config;
pub mod core;
pub mod embed;
pub mod generator;
pub mod logger;
pub mod page;
pub mod utils;
