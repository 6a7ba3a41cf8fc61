use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Index, parse_macro_input};

pub(crate) fn uuid_wrapper(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Struct(data_struct) = &input.data else {
        return error(&input, "UuidWrapper only works on structs.");
    };

    if data_struct.fields.len() != 1 {
        return error(&input, "UuidWrapper requires a struct with exactly one field.");
    }

    let Some((uuid_field_idx, uuid_field)) = data_struct
        .fields
        .iter()
        .enumerate()
        .find(|(_, field)| field.attrs.iter().any(|attr| attr.path().is_ident("uuid")))
    else {
        return error(
            &input,
            "UuidWrapper requires an #[uuid] annotation on the wrapped field",
        );
    };

    let (accessor, constructor) = if let Some(ident) = uuid_field.ident.as_ref() {
        (quote! { #ident }, quote! { #name { #ident: uuid } })
    } else {
        let index = Index::from(uuid_field_idx);
        (quote! { #index }, quote! { #name(uuid) })
    };

    TokenStream::from(quote! {
        impl ::serde::Serialize for #name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                ::serde::Serialize::serialize(&self.#accessor, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for #name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let uuid = <::uuid::Uuid as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok(#constructor)
            }
        }

        impl #name {
            pub fn new_random() -> Self {
                let uuid = ::uuid::Uuid::new_v4();
                #constructor
            }

            pub fn uuid(&self) -> ::uuid::Uuid {
                self.#accessor
            }
        }

        impl ::core::convert::From<::uuid::Uuid> for #name {
            fn from(uuid: ::uuid::Uuid) -> Self {
                #constructor
            }
        }

        impl ::core::fmt::Display for #name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.#accessor, f)
            }
        }
    })
}

fn error(input: &DeriveInput, msg: impl std::fmt::Display) -> TokenStream {
    syn::Error::new_spanned(input, msg)
        .to_compile_error()
        .into()
}
