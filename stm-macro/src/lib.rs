//! `#[derive(Transactional)]` for epoch-stm.
//!
//! For a struct `Name` with named fields the derive emits `NameCells`, a
//! struct with the same visibility and the same fields in the same order,
//! where every field has the type `<FieldTy as Transactional>::Cells`. Scalar
//! fields thereby become `TCell`s and fields that themselves derive
//! `Transactional` become their own generated record.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, FieldsNamed, LitStr, Path};

#[proc_macro_derive(Transactional, attributes(transactional))]
pub fn derive_transactional(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[derive(Transactional)] does not support generic records",
        ));
    }

    let fields = named_fields(&input)?;

    let vis = &input.vis;
    let name = &input.ident;
    let cells = format_ident!("{}Cells", name);
    let krate = crate_path(&input)?;

    let names: Vec<_> = fields.named.iter().filter_map(|f| f.ident.as_ref()).collect();
    let types: Vec<_> = fields.named.iter().map(|f| &f.ty).collect();
    let field_vis: Vec<_> = fields.named.iter().map(|f| &f.vis).collect();
    let name_strs: Vec<_> = names
        .iter()
        .map(|n| LitStr::new(&n.to_string(), Span::call_site()))
        .collect();

    let doc = format!("Transactional form of [`{}`], one cell per field.", name);

    Ok(quote! {
        #[doc = #doc]
        #[derive(Debug, Default)]
        #vis struct #cells {
            #( #field_vis #names: <#types as #krate::Transactional>::Cells, )*
        }

        impl #krate::Transactional for #name {
            type Cells = #cells;

            const FIELD_NAMES: &'static [&'static str] = &[ #( #name_strs ),* ];

            fn new_cells(self) -> #cells {
                #cells {
                    #( #names: #krate::Transactional::new_cells(self.#names), )*
                }
            }

            #[allow(unused_variables)]
            fn load<'a>(
                cells: &'a #cells,
                tx: &mut #krate::Transaction<'a>,
            ) -> #krate::StmResult<Self> {
                ::core::result::Result::Ok(#name {
                    #( #names: <#types as #krate::Transactional>::load(&cells.#names, tx)?, )*
                })
            }

            #[allow(unused_variables)]
            fn store<'a>(
                cells: &'a #cells,
                tx: &mut #krate::Transaction<'a>,
                value: Self,
            ) -> #krate::StmResult<()> {
                #( <#types as #krate::Transactional>::store(&cells.#names, tx, value.#names)?; )*
                ::core::result::Result::Ok(())
            }
        }

        impl ::core::convert::From<#name> for #cells {
            fn from(value: #name) -> #cells {
                #krate::Transactional::new_cells(value)
            }
        }
    })
}

fn crate_path(input: &DeriveInput) -> syn::Result<Path> {
    let mut krate: Path = syn::parse_quote!(::epoch_stm);
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("transactional")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                krate = meta.value()?.parse::<LitStr>()?.parse()?;
                Ok(())
            } else {
                Err(meta.error("unsupported transactional attribute, expected `crate`"))
            }
        })?;
    }
    Ok(krate)
}

fn named_fields(input: &DeriveInput) -> syn::Result<&FieldsNamed> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields),
            Fields::Unnamed(_) | Fields::Unit => Err(syn::Error::new(
                input.ident.span(),
                "#[derive(Transactional)] requires a struct with named fields",
            )),
        },
        Data::Enum(_) | Data::Union(_) => Err(syn::Error::new(
            input.ident.span(),
            "#[derive(Transactional)] can only be applied to structs",
        )),
    }
}
