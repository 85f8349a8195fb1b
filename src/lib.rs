//! Publishes the latest CI-built Geode mod as a tagged GitHub release.
//!
//! The pipeline picks the newest completed run of a workflow, downloads its `Build Output`
//! artifact, digs the `.geode` module out of it, reads the version from the module's `mod.json`
//! and finally creates a tag and a release carrying the module as an asset.
//!
//! See: [`pipeline::run`]

pub mod archive;
pub mod config;
pub mod env;
pub mod error;
pub mod github;
pub mod metadata;
pub mod module;
pub mod pipeline;
pub mod transactions;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use error::{ReleaseError, Result};

/// A shorthand to define a statically allocated variable using a [`std::sync::LazyLock`].
///
/// # Examples
///
/// ```rust
/// # use geode_publish::static_lazy_lock;
/// # use std::sync::LazyLock;
/// static_lazy_lock! {
///     pub VAR_1: String = String::from("a static variable");
/// }
/// // ...equals to...
/// pub static VAR_2: LazyLock<String> = LazyLock::new(|| String::from("a static variable"));
/// ```
#[macro_export]
macro_rules! static_lazy_lock {
    ($(#[$meta:meta])* $vis:vis $name:ident: $type:ty = $expr:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::__priv_macro_use::LazyLock<$type> =
            $crate::__priv_macro_use::LazyLock::new(|| $expr);
    };
}

#[doc(hidden)]
pub mod __priv_macro_use {
    pub use std::sync::LazyLock;
}
