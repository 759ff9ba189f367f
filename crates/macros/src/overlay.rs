//! Overlay derive macro implementation

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, GenericArgument, Ident, Lifetime, PathArguments, Type};

use crate::parse::{parse_overlay, FieldSource, OverlayArgs, OverlayFieldArgs};

/// Extract the inner type from `PhantomData<T>` if present, otherwise return the type as-is
fn extract_inner_type(ty: &Type) -> &Type {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "PhantomData" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return inner;
                    }
                }
            }
        }
    }
    ty
}

fn is_phantom_data(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "PhantomData";
        }
    }
    false
}

/// Accessor name for a field, leading underscore stripped
fn clean_name(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix('_').unwrap_or(&name).to_string()
}

/// Generate the Overlay implementation
pub fn derive_overlay(input: DeriveInput) -> TokenStream {
    match parse_overlay(&input) {
        Ok(args) => generate_impl(args).unwrap_or_else(|e| e.to_compile_error()),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: OverlayArgs) -> syn::Result<TokenStream> {
    let struct_name = &args.ident;

    let fields = match &args.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Overlay can only be derived for structs",
            ))
        }
    };

    for required in ["ptr", "sdk"] {
        if !fields.iter().any(|f| f.is_named(required)) {
            return Err(syn::Error::new_spanned(
                struct_name,
                format!("Overlay structs need a `{}` field", required),
            ));
        }
    }

    let lifetime = args
        .generics
        .lifetimes()
        .next()
        .map(|def| def.lifetime.clone())
        .ok_or_else(|| {
            syn::Error::new_spanned(
                struct_name,
                "Overlay structs borrow the Sdk and need a lifetime parameter",
            )
        })?;

    let accessors = fields
        .iter()
        .filter(|f| f.is_accessor())
        .map(|f| generate_accessors(&args, f))
        .collect::<syn::Result<Vec<_>>>()?;

    let constants = generate_constants(&args, fields);
    let constructor = generate_constructor(fields, &lifetime);
    let trait_impl = generate_trait_impl(&args, &lifetime);

    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #constants
            #constructor
            #(#accessors)*
        }

        #trait_impl
    })
}

fn generate_accessors(args: &OverlayArgs, field: &OverlayFieldArgs) -> syn::Result<TokenStream> {
    let Some(field_ident) = field.ident.as_ref() else {
        return Ok(quote! {});
    };
    let field_ty = extract_inner_type(&field.ty);

    let name = clean_name(field_ident);
    let getter_name = format_ident!("{}", name);
    let setter_name = format_ident!("set_{}", name);
    let view_name = format_ident!("{}_view", name);
    let const_name = format_ident!("{}_FIELD", name.to_uppercase());

    // How the view is built depends on which lookup owns the offset
    let (view, described) = match field.source() {
        Some(FieldSource::Netvar(path)) => {
            let table = args.table.as_deref().ok_or_else(|| {
                syn::Error::new_spanned(
                    field_ident,
                    "`netvar` fields need #[overlay(table = \"...\")] on the struct",
                )
            })?;
            (
                quote! { self.sdk.field::<#field_ty>(self.ptr, #table, Self::#const_name) },
                format!("`{}.{}`", table, path),
            )
        }
        Some(FieldSource::Offset(offset)) => {
            let structure = args.structure.as_deref().ok_or_else(|| {
                syn::Error::new_spanned(
                    field_ident,
                    "`offset` fields need #[overlay(structure = \"...\")] on the struct",
                )
            })?;
            (
                quote! { self.sdk.offset_field::<#field_ty>(self.ptr, #structure, Self::#const_name) },
                format!("`{}.{}`", structure, offset),
            )
        }
        None => return Ok(quote! {}),
    };

    let view_doc = format!("Typed view of {}", described);
    let getter_doc = format!("Read {}", described);
    let setter_doc = format!("Write {}", described);

    let setter = if field.readonly {
        quote! {}
    } else {
        quote! {
            #[doc = #setter_doc]
            #[inline]
            pub fn #setter_name(&mut self, value: #field_ty) -> ::std::result::Result<(), ::srcsdk_core::ResolveError> {
                let view = self.#view_name()?;
                unsafe { view.write(value) };
                Ok(())
            }
        }
    };

    Ok(quote! {
        #[doc = #view_doc]
        #[inline]
        pub fn #view_name(&self) -> ::std::result::Result<::srcsdk_core::FieldView<#field_ty>, ::srcsdk_core::ResolveError> {
            #view
        }

        #[doc = #getter_doc]
        #[inline]
        pub fn #getter_name(&self) -> ::std::result::Result<#field_ty, ::srcsdk_core::ResolveError> {
            let view = self.#view_name()?;
            Ok(unsafe { view.read() })
        }

        #setter
    })
}

fn generate_constants(args: &OverlayArgs, fields: &[OverlayFieldArgs]) -> TokenStream {
    let field_constants = fields.iter().filter_map(|f| {
        let field_ident = f.ident.as_ref()?;
        let value = match f.source()? {
            FieldSource::Netvar(path) => path,
            FieldSource::Offset(field) => field,
        };

        let const_name = format_ident!("{}_FIELD", clean_name(field_ident).to_uppercase());
        let doc = format!("Lookup key for `{}`", clean_name(field_ident));

        Some(quote! {
            #[doc = #doc]
            pub const #const_name: &'static str = #value;
        })
    });

    let table = option_tokens(args.table.as_deref());
    let structure = option_tokens(args.structure.as_deref());

    quote! {
        /// Property table `netvar` fields resolve against
        pub const TABLE: ::std::option::Option<&'static str> = #table;

        /// Offset-table structure `offset` fields resolve against
        pub const STRUCTURE: ::std::option::Option<&'static str> = #structure;

        #(#field_constants)*
    }
}

fn option_tokens(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote! { ::std::option::Option::Some(#value) },
        None => quote! { ::std::option::Option::None },
    }
}

fn generate_constructor(fields: &[OverlayFieldArgs], lifetime: &Lifetime) -> TokenStream {
    let field_inits: Vec<_> = fields
        .iter()
        .filter(|f| !f.is_named("ptr") && !f.is_named("sdk"))
        .filter_map(|f| {
            let ident = f.ident.as_ref()?;
            if is_phantom_data(&f.ty) {
                Some(quote! { #ident: ::std::marker::PhantomData })
            } else {
                Some(quote! { #ident: ::std::default::Default::default() })
            }
        })
        .collect();

    quote! {
        /// Wrap the object at `ptr`
        ///
        /// Returns `None` for a null address.
        ///
        /// # Safety
        /// `ptr` must point to a live host object described by this overlay's
        /// table or structure, for as long as the overlay is used.
        pub unsafe fn new(sdk: &#lifetime ::srcsdk_core::Sdk, ptr: ::srcsdk_core::sdk::Address) -> ::std::option::Option<Self> {
            let ptr = ptr.non_null()?;
            Some(Self {
                ptr,
                sdk,
                #(#field_inits),*
            })
        }

        /// Address of the wrapped object
        pub fn address(&self) -> ::srcsdk_core::sdk::Address {
            self.ptr
        }
    }
}

fn generate_trait_impl(args: &OverlayArgs, lifetime: &Lifetime) -> TokenStream {
    let struct_name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();
    let table = option_tokens(args.table.as_deref());
    let structure = option_tokens(args.structure.as_deref());

    quote! {
        impl #impl_generics ::srcsdk_core::Overlay<#lifetime> for #struct_name #ty_generics #where_clause {
            const TABLE: ::std::option::Option<&'static str> = #table;
            const STRUCTURE: ::std::option::Option<&'static str> = #structure;

            unsafe fn from_address(sdk: &#lifetime ::srcsdk_core::Sdk, address: ::srcsdk_core::sdk::Address) -> ::std::option::Option<Self> {
                Self::new(sdk, address)
            }

            fn address(&self) -> ::srcsdk_core::sdk::Address {
                self.ptr
            }

            fn sdk(&self) -> &#lifetime ::srcsdk_core::Sdk {
                self.sdk
            }
        }
    }
}
