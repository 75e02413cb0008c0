//! Bundlewise Cart Transform Function.
//!
//! Shopify runs this crate (compiled to `wasm32-wasip1`) for every cart
//! change. The input is shaped by `src/run.graphql`; all pricing logic lives
//! in [`bundlewise_core::cart_transform`], and [`run`] only adapts the
//! generated input and output types to it.
//!
//! # Usage
//!
//! ```bash
//! shopify app function build
//! shopify app function run --export cart_transform_run < input.json
//! ```

// `#[shopify_function]` emits the wasm export with `#[export_name]`.
#![allow(unsafe_code)]

use std::process;

use shopify_function::prelude::*;

mod run;

#[typegen("schema.graphql", enums_as_str = ["CurrencyCode"])]
pub mod schema {
    #[query("src/run.graphql")]
    pub mod run {}
}

#[allow(clippy::print_stderr)]
fn main() {
    std::eprintln!("Please invoke a named export.");
    process::exit(1);
}
