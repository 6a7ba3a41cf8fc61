mod uuid_wrapper;
mod value_wrapper;

use proc_macro::TokenStream;

use crate::{uuid_wrapper::uuid_wrapper, value_wrapper::value_wrapper};

/// Implements serde, `Display` and conversions for a newtype around [`uuid::Uuid`].
///
/// The wrapped field must carry an `#[uuid]` annotation.
#[proc_macro_derive(UuidWrapper, attributes(uuid))]
pub fn derive_uuid_wrapper(input: TokenStream) -> TokenStream {
    uuid_wrapper(input)
}

/// Generates typed accessors (`as_*`, `as_*_ref`, `into_*`) and `From` impls for a
/// single-field tuple enum.
///
/// ```ignore
/// #[derive(ValueWrapper)]
/// #[unwrap_error(error(crate::errors::GraphError), variant(MismatchedDataType))]
/// pub enum GraphValue {
///     #[trivial_copy]
///     Float(f32),
///     Id(StringId),
/// }
/// ```
#[proc_macro_derive(ValueWrapper, attributes(unwrap_error, trivial_copy))]
pub fn derive_value_wrapper(input: TokenStream) -> TokenStream {
    value_wrapper(input)
}
