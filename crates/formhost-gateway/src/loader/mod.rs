//! Dynamic form loading.
//!
//! - `source`: fetches compiled program text for `name`/`version`
//! - `runtime`: turns program text into an executable module (wasmtime)
//! - `dynamic`: the cache, single-flight coalescing and invalidation
//!
//! `FormSource` and `FormRuntime` are traits so the loader can be driven by
//! in-memory fakes in tests.

pub mod dynamic;
pub mod runtime;
pub mod source;

pub use dynamic::{cache_key, CacheEntry, DynamicModuleLoader, LoadOptions, LATEST};
pub use runtime::{FormModule, FormRuntime, RenderContext, RenderOutput, UiNode, WasmFormRuntime};
pub use source::{FetchedForm, FormSource, HttpFormSource};
