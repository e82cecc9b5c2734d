mod hash_record;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(HashRecord)] derive macro
// ============================================================================

/// Derive macro for the `HashRecord` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, HashRecord)]
/// #[record(collection = "restaurants")]
/// struct Restaurant {
///     #[record(id)]
///     pub id: String,
///     pub name: String,
///     pub view_count: u64,
///     #[record(skip)]
///     pub cuisines: BTreeSet<String>,
/// }
/// ```
///
/// - `#[record(collection = "...")]` sets the collection name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[record(id)]` marks the field used as the unique identifier.
///   If omitted, defaults to a field named `id`.
/// - `#[record(skip)]` keeps a field out of the stored hash. It is rebuilt with
///   `Default::default()` when the record is read back.
///
/// Every stored field is written with `ToString` and read back with `FromStr`.
#[proc_macro_derive(HashRecord, attributes(record))]
pub fn derive_hash_record(input: TokenStream) -> TokenStream {
    hash_record::derive_hash_record(input)
}
