//! Ordering of `use` entries in emitted files.
//!
//! Entries are grouped, each group sorted alphabetically:
//!
//! 1. standard library (`std`, `core`, `alloc`)
//! 2. third-party crates
//! 3. the generated crate itself (`crate`, `self`, `super`, or its name)
//! 4. aliased entries (`x::Y as Z`)
//!
//! Duplicates (exact string match) are dropped.

use std::collections::BTreeSet;

use proc_macro2::TokenStream;
use quote::quote;

use crate::errors::GeneratorError;

const CORE_ROOTS: &[&str] = &["std", "core", "alloc"];
const APP_ROOTS: &[&str] = &["crate", "self", "super"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Category {
    Core,
    ThirdParty,
    App,
    Alias,
}

fn category(entry: &str, crate_name: &str) -> Category {
    if entry.contains(" as ") {
        return Category::Alias;
    }
    let root = entry.split("::").next().unwrap_or(entry).trim();
    if CORE_ROOTS.contains(&root) {
        Category::Core
    } else if APP_ROOTS.contains(&root) || root == crate_name {
        Category::App
    } else {
        Category::ThirdParty
    }
}

/// Orders `use` paths into their emission order.
///
/// ## Examples
///
/// ```
/// use sdkgen_lib::imports::order_imports;
///
/// let ordered = order_imports(
///     ["crate::urls", "serde::Deserialize", "std::collections::HashMap", "crate::urls"],
///     "solcast",
/// );
/// assert_eq!(ordered, vec!["std::collections::HashMap", "serde::Deserialize", "crate::urls"]);
/// ```
pub fn order_imports<I, S>(entries: I, crate_name: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<(Category, String)> = entries
        .into_iter()
        .map(|entry| {
            let entry = entry.as_ref().trim().to_string();
            (category(&entry, crate_name), entry)
        })
        .filter(|(_, entry)| !entry.is_empty())
        .collect();
    unique.into_iter().map(|(_, entry)| entry).collect()
}

/// Renders ordered entries as `use` items.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` if an entry is not a valid use tree.
pub fn use_items<I, S>(entries: I, crate_name: &str) -> Result<TokenStream, GeneratorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut items = TokenStream::new();
    for entry in order_imports(entries, crate_name) {
        let tree: syn::UseTree = syn::parse_str(&entry)
            .map_err(|e| GeneratorError::CodeGenError(format!("invalid import '{}': {}", entry, e)))?;
        items.extend(quote! { use #tree; });
    }
    Ok(items)
}
