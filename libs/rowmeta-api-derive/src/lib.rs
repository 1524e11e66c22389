use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

/// Derive macro for typed access to a `Record` or `MetaNode`.
///
/// Implements `rowmeta_api::binding::RowBinding` on the annotated struct:
///
/// - `column_names() -> Vec<&'static str>`: columns in field order.
/// - `read_from(&impl Accessor) -> Self`: each field is read with
///   `get(column, default)`, the default coming from `Self::default()`.
/// - `write_to(&self, &mut impl Accessor)`: each field is stored with `set`.
///
/// The struct must implement `Default`. Field types must implement `FromValue`,
/// `Into<Value>` and `Clone`; `Option<T>` maps to a nullable column.
///
/// # Example
///
/// ```ignore
/// #[derive(RowBinding, Default)]
/// pub struct Customer {
///     pub id: i64,
///
///     #[column(name = "FullName")]
///     pub name: String,
///
///     pub email: Option<String>,
///
///     #[column(skip)]
///     pub cached_score: f64,
/// }
/// ```
#[proc_macro_derive(RowBinding, attributes(column))]
pub fn derive_row_binding(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "RowBinding only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "RowBinding only supports structs",
            ))
        }
    };

    let mut column_tokens = Vec::new();
    let mut read_tokens = Vec::new();
    let mut write_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;

        // Parse #[column(...)] attribute.
        let mut column_str: Option<String> = None;
        let mut skip = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("column") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    column_str = Some(value.value());
                } else if meta.path.is_ident("skip") {
                    skip = true;
                } else {
                    return Err(meta.error("unknown column attribute (expected `name` or `skip`)"));
                }
                Ok(())
            })?;
        }

        if skip {
            read_tokens.push(quote! { #field_name: __defaults.#field_name });
            continue;
        }

        if let Type::Reference(_) = &field.ty {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "RowBinding fields must own their data (found a reference)",
            ));
        }

        let column_str = column_str.unwrap_or_else(|| field_name.to_string());
        if column_str.trim().is_empty() {
            return Err(syn::Error::new_spanned(field_name, "column name must not be empty"));
        }

        column_tokens.push(quote! { #column_str });
        read_tokens.push(quote! {
            #field_name: rowmeta_api::accessor::Accessor::get(__source, #column_str, __defaults.#field_name)
        });
        write_tokens.push(quote! {
            let _ = rowmeta_api::accessor::Accessor::set(
                &mut *__target,
                #column_str,
                ::core::clone::Clone::clone(&self.#field_name),
            );
        });
    }

    let expanded = quote! {
        impl #impl_generics rowmeta_api::binding::RowBinding for #name #ty_generics #where_clause {
            fn column_names() -> ::std::vec::Vec<&'static str> {
                vec![#(#column_tokens),*]
            }

            fn read_from<__A: rowmeta_api::accessor::Accessor>(__source: &__A) -> Self {
                let __defaults = <Self as ::core::default::Default>::default();
                Self {
                    #(#read_tokens),*
                }
            }

            fn write_to<__A: rowmeta_api::accessor::Accessor>(&self, __target: &mut __A) {
                #(#write_tokens)*
            }
        }
    };

    Ok(TokenStream::from(expanded))
}
