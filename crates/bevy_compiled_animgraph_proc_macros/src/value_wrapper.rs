use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, Path, parenthesized, parse_macro_input};

struct UnwrapError {
    error: Path,
    variant: Ident,
}

pub(crate) fn value_wrapper(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return error(&input, "ValueWrapper only works on enums.");
    };

    let unwrap_error = match parse_unwrap_error(&input) {
        Ok(Some(unwrap_error)) => unwrap_error,
        Ok(None) => {
            return error(
                &input,
                "ValueWrapper requires #[unwrap_error(error(..), variant(..))]",
            );
        }
        Err(err) => return err.to_compile_error().into(),
    };
    let error_ty = &unwrap_error.error;
    let error_variant = &unwrap_error.variant;

    let mut variant_names = Vec::new();
    let mut accessors = Vec::new();
    let mut conversions = Vec::new();

    for variant in &data_enum.variants {
        let ident = &variant.ident;
        let label = ident.to_string();

        let Fields::Unnamed(fields) = &variant.fields else {
            return error(&input, "ValueWrapper variants must have one unnamed field.");
        };
        if fields.unnamed.len() != 1 {
            return error(&input, "ValueWrapper variants must have one unnamed field.");
        }
        let inner = &fields.unnamed[0].ty;

        let snake = to_snake_case(&label);
        let into_fn = Ident::new(&format!("into_{snake}"), Span::call_site());
        let as_ref_fn = Ident::new(&format!("as_{snake}_ref"), Span::call_site());

        variant_names.push(quote! { #name::#ident(_) => #label, });

        accessors.push(quote! {
            pub fn #into_fn(self) -> ::core::result::Result<#inner, #error_ty> {
                match self {
                    #name::#ident(value) => Ok(value),
                    other => Err(#error_ty::#error_variant(
                        #label.to_string(),
                        other.variant_name().to_string(),
                    )),
                }
            }

            pub fn #as_ref_fn(&self) -> ::core::result::Result<&#inner, #error_ty> {
                match self {
                    #name::#ident(value) => Ok(value),
                    other => Err(#error_ty::#error_variant(
                        #label.to_string(),
                        other.variant_name().to_string(),
                    )),
                }
            }
        });

        let trivial_copy = variant
            .attrs
            .iter()
            .any(|attr| attr.path().is_ident("trivial_copy"));
        if trivial_copy {
            let as_fn = Ident::new(&format!("as_{snake}"), Span::call_site());
            accessors.push(quote! {
                pub fn #as_fn(&self) -> ::core::result::Result<#inner, #error_ty> {
                    match self {
                        #name::#ident(value) => Ok(*value),
                        other => Err(#error_ty::#error_variant(
                            #label.to_string(),
                            other.variant_name().to_string(),
                        )),
                    }
                }
            });
        }

        conversions.push(quote! {
            impl ::core::convert::From<#inner> for #name {
                fn from(value: #inner) -> Self {
                    #name::#ident(value)
                }
            }
        });
    }

    TokenStream::from(quote! {
        impl #name {
            pub fn variant_name(&self) -> &'static str {
                match self {
                    #(#variant_names)*
                }
            }

            #(#accessors)*
        }

        #(#conversions)*
    })
}

fn parse_unwrap_error(input: &DeriveInput) -> syn::Result<Option<UnwrapError>> {
    let Some(attr) = input
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("unwrap_error"))
    else {
        return Ok(None);
    };

    let mut error_path = None;
    let mut variant = None;

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("error") {
            let content;
            parenthesized!(content in meta.input);
            error_path = Some(content.parse::<Path>()?);
            Ok(())
        } else if meta.path.is_ident("variant") {
            let content;
            parenthesized!(content in meta.input);
            variant = Some(content.parse::<Ident>()?);
            Ok(())
        } else {
            Err(meta.error("expected `error(..)` or `variant(..)`"))
        }
    })?;

    match (error_path, variant) {
        (Some(error), Some(variant)) => Ok(Some(UnwrapError { error, variant })),
        _ => Err(syn::Error::new_spanned(
            attr,
            "unwrap_error needs both error(..) and variant(..)",
        )),
    }
}

/// `EventQueue` -> `event_queue`, `F32` -> `f32`, `Vec3` -> `vec3`
fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

fn error(input: &DeriveInput, msg: impl std::fmt::Display) -> TokenStream {
    syn::Error::new_spanned(input, msg)
        .to_compile_error()
        .into()
}
