//! Procedural macros for the docrepo project.
//!
//! `#[derive(Entity)]` implements `docrepo::entity::Entity` from declarative attributes:
//!
//! - `#[entity(id)]` on exactly one field of type `Option<ObjectId>`, the identifier;
//! - `#[entity(collection = "...")]` on the struct, the collection name (defaults to the type
//!   name);
//! - `#[entity(crate = "...")]` on the struct, the path the core crate is reachable at (defaults
//!   to `::docrepo`).
//!
//! The identifier field is resolved once, at compile time. The struct must also implement
//! `Default`, which supplies the fields a stored document lacks.

#[allow(unused_extern_crates)]
extern crate self as docrepo_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, LitStr, Path, Result, Type, parse_macro_input};

#[proc_macro_derive(Entity, attributes(entity))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    impl_entity_macro(&ast)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

struct ContainerArgs {
    collection: Option<LitStr>,
    krate: Option<Path>,
}

fn impl_entity_macro(ast: &DeriveInput) -> Result<TokenStream2> {
    let args = container_args(ast)?;
    let id_field = id_field(ast)?;

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let krate = args
        .krate
        .unwrap_or_else(|| syn::parse_quote!(::docrepo));
    let collection = args
        .collection
        .unwrap_or_else(|| LitStr::new(&name.to_string(), name.span()));
    let member = id_field
        .ident
        .as_ref()
        .ok_or_else(|| Error::new_spanned(id_field, "identifier field must be named"))?;

    Ok(quote! {
        impl #impl_generics #krate::entity::Entity for #name #ty_generics #where_clause {
            fn id(&self) -> ::core::option::Option<&#krate::bson::oid::ObjectId> {
                self.#member.as_ref()
            }

            fn collection_name() -> &'static str {
                #collection
            }
        }
    })
}

fn container_args(ast: &DeriveInput) -> Result<ContainerArgs> {
    let mut args = ContainerArgs { collection: None, krate: None };

    for attr in ast.attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                args.collection = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("crate") {
                let path: LitStr = meta.value()?.parse()?;
                args.krate = Some(path.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `collection` or `crate`"))
            }
        })?;
    }

    Ok(args)
}

fn id_field(ast: &DeriveInput) -> Result<&Field> {
    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => return Err(Error::new_spanned(&ast.ident, "Entity requires named fields")),
        },
        _ => return Err(Error::new_spanned(&ast.ident, "Entity can only be derived for structs")),
    };

    let mut tagged = Vec::new();
    for field in fields {
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    tagged.push(field);
                    Ok(())
                } else {
                    Err(meta.error("expected `id`"))
                }
            })?;
        }
    }

    let field = match tagged.as_slice() {
        [field] => *field,
        [] => {
            return Err(Error::new_spanned(
                &ast.ident,
                "Entity requires one field tagged `#[entity(id)]`",
            ));
        }
        [_, second, ..] => {
            return Err(Error::new_spanned(
                second,
                "only one field can be tagged `#[entity(id)]`",
            ));
        }
    };

    if !is_option(&field.ty) {
        return Err(Error::new_spanned(
            &field.ty,
            "identifier field must be an `Option<ObjectId>`",
        ));
    }

    Ok(field)
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
