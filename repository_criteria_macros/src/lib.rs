mod model;

use proc_macro::TokenStream;

/// Derive macro for the `Model` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Model)]
/// #[model(table = "posts", soft_deletes)]
/// struct Post {
///     #[model(id)]
///     pub slug: String,
///     pub title: String,
///     #[serde(default)]
///     pub deleted_at: Option<String>,
/// }
/// ```
///
/// - `#[model(table = "...")]` sets the table name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[model(soft_deletes)]` declares soft-delete support.
/// - `#[model(id)]` marks the `String` field used as the primary key.
///   If omitted, defaults to a field named `id`.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input)
}
