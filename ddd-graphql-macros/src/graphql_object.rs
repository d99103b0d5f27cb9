use crate::field_utils::{collect_fields, option_str};
use crate::type_attr::TypeAttrConfig;
use crate::utils::{apply_derives, doc_string};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, parse_macro_input};

/// #[graphql_object] 宏实现
/// - 合并/追加派生：Debug, Clone, Default, PartialEq
/// - 实现 `GraphQLType`（JSON 键为 GraphQL 字段名）与 `ObjectLayout`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as TypeAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[graphql_object] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let fields = match collect_fields(fields_named, &[]) {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    apply_derives(
        &mut st.attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(Default),
            syn::parse_quote!(PartialEq),
        ],
    );

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let name = cfg
        .name
        .map(|lit| lit.value())
        .unwrap_or_else(|| ident.to_string());
    let description = option_str(doc_string(&st.attrs).as_deref());

    let visible: Vec<_> = fields.iter().filter(|f| !f.skip).collect();

    let descriptors = visible.iter().map(|f| {
        let ty = &f.ty;
        let field_name = &f.name;
        let field_description = f.description_tokens();
        quote! {
            ::ddd_graphql::layout::FieldDescriptor::new(
                #field_name,
                #field_description,
                <#ty as ::ddd_graphql::layout::GraphQLType>::type_descriptor(),
            )
        }
    });

    let inserts = visible.iter().map(|f| {
        let field_ident = &f.ident;
        let ty = &f.ty;
        let field_name = &f.name;
        quote! {
            map.insert(
                ::std::string::String::from(#field_name),
                <#ty as ::ddd_graphql::layout::GraphQLType>::to_json(&self.#field_ident)?,
            );
        }
    });

    let initializers = fields.iter().map(|f| {
        let field_ident = &f.ident;
        let ty = &f.ty;
        let field_name = &f.name;
        if f.skip {
            quote! { #field_ident: ::std::default::Default::default() }
        } else {
            quote! {
                #field_ident: <#ty as ::ddd_graphql::layout::GraphQLType>::from_json(
                    ::ddd_graphql::__private::take_field(&mut map, #field_name),
                )?
            }
        }
    });

    let expanded = quote! {
        #st

        impl #impl_generics ::ddd_graphql::layout::GraphQLType for #ident #ty_generics #where_clause {
            fn type_descriptor() -> ::ddd_graphql::layout::TypeDescriptor {
                ::ddd_graphql::layout::TypeDescriptor::Object(
                    <Self as ::ddd_graphql::layout::ObjectLayout>::object_descriptor(),
                )
            }

            fn to_json(
                &self,
            ) -> ::ddd_graphql::__private::serde_json::Result<::ddd_graphql::__private::serde_json::Value> {
                #[allow(unused_mut)]
                let mut map = ::ddd_graphql::__private::serde_json::Map::new();
                #(#inserts)*
                ::std::result::Result::Ok(::ddd_graphql::__private::serde_json::Value::Object(map))
            }

            fn from_json(
                value: ::ddd_graphql::__private::serde_json::Value,
            ) -> ::ddd_graphql::__private::serde_json::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut map = ::ddd_graphql::__private::expect_object(value, #name)?;
                ::std::result::Result::Ok(Self {
                    #(#initializers),*
                })
            }
        }

        impl #impl_generics ::ddd_graphql::layout::ObjectLayout for #ident #ty_generics #where_clause {
            fn object_descriptor() -> ::ddd_graphql::layout::ObjectDescriptor {
                ::ddd_graphql::layout::ObjectDescriptor::new(
                    #name,
                    #description,
                    ::std::vec![#(#descriptors),*],
                )
            }
        }
    };

    TokenStream::from(expanded)
}
