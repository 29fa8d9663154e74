// SPDX-License-Identifier: MIT

//! Built-in processors
//!
//! These ship with the daemon and exercise the pipeline contract. To
//! activate one, install a `registry.processor` entry whose id matches the
//! id the handler was registered under.

mod clean_deps;
mod kind_lint;

pub use clean_deps::CleanDeps;
pub use kind_lint::KindLint;
