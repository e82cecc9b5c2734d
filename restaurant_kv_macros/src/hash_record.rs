use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr};

pub fn derive_hash_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "HashRecord derive only supports structs with named fields",
                )
                .to_compile_error()
                .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "HashRecord derive only supports structs")
                .to_compile_error()
                .into()
        }
    };

    let collection = extract_collection(&input);

    let mut id_field: Option<Ident> = None;
    let mut stored = Vec::new();
    let mut skipped = Vec::new();

    for field in fields {
        let ident = field.ident.clone().expect("named field");
        let flags = field_flags(&field.attrs);

        if flags.is_id {
            id_field = Some(ident.clone());
        }

        if flags.is_skip {
            skipped.push(ident);
        } else {
            stored.push(ident);
        }
    }

    let id_field = match id_field.or_else(|| stored.iter().find(|i| *i == "id").cloned()) {
        Some(ident) => ident,
        None => {
            return syn::Error::new_spanned(
                name,
                "HashRecord derive: no field marked with #[record(id)] and no field named `id`",
            )
            .to_compile_error()
            .into()
        }
    };

    let stored_names: Vec<LitStr> = stored
        .iter()
        .map(|ident| LitStr::new(&ident.to_string(), ident.span()))
        .collect();

    let expanded = quote! {
        impl ::restaurant_kv::HashRecord for #name {
            const COLLECTION: &'static str = #collection;

            fn id(&self) -> &str {
                &self.#id_field
            }

            fn to_fields(&self) -> ::std::vec::Vec<(::std::string::String, ::std::string::String)> {
                ::std::vec![
                    #( (
                        ::std::string::String::from(#stored_names),
                        ::std::string::ToString::to_string(&self.#stored),
                    ) ),*
                ]
            }

            fn from_fields(
                fields: &::std::collections::HashMap<::std::string::String, ::std::string::String>,
            ) -> ::std::result::Result<Self, ::restaurant_kv::RecordError> {
                ::std::result::Result::Ok(Self {
                    #( #stored: ::restaurant_kv::record::parse_field(
                        Self::COLLECTION,
                        fields,
                        #stored_names,
                    )?, )*
                    #( #skipped: ::std::default::Default::default(), )*
                })
            }
        }
    };

    TokenStream::from(expanded)
}

struct FieldFlags {
    is_id: bool,
    is_skip: bool,
}

fn field_flags(attrs: &[Attribute]) -> FieldFlags {
    let mut flags = FieldFlags {
        is_id: false,
        is_skip: false,
    };

    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                flags.is_id = true;
            } else if meta.path.is_ident("skip") {
                flags.is_skip = true;
            }
            Ok(())
        });
    }

    flags
}

fn extract_collection(input: &DeriveInput) -> String {
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        let mut collection = None;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
            }
            Ok(())
        });

        if let Some(c) = collection {
            return c;
        }
    }

    // Default: snake_case struct name + "s"
    format!("{}s", to_snake_case(&input.ident.to_string()))
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
