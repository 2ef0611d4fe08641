//! vuexdoc: publish cross-linked HTML documentation for Vue components,
//! Vuex stores and models from a documentation host's doclet dump.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. [`tags`] applies the store/component/model vocabulary to raw doclets.
//! 2. [`normalize`] prunes, sorts and enriches the [`docset::DocSet`],
//!    registering every URL in the [`link::LinkRegistry`].
//! 3. [`nav`] builds the sidebar.
//! 4. [`emit`] renders pages through the [`view::View`] and writes them.
//! 5. [`assets`] copies template and user static files.
//!
//! [`publish::publish`] drives one full run.

pub mod assets;
pub mod config;
pub mod docset;
pub mod emit;
pub mod error;
pub mod link;
pub mod markdown;
pub mod model;
pub mod nav;
pub mod normalize;
pub mod publish;
pub mod tags;
pub mod tutorial;
pub mod view;

pub use config::Config;
pub use error::{PublishError, Result};
pub use model::Doclet;
pub use publish::{publish, Summary};
