use crate::field_utils::{collect_fields, option_str};
use crate::type_attr::TypeAttrConfig;
use crate::utils::{apply_derives, doc_string, ensure_required_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, parse_macro_input};

const CLIENT_MUTATION_ID: &str = "client_mutation_id";

/// #[graphql_command] 宏实现
/// - 追加字段：`client_mutation_id: Option<String>`（若缺失，置于最前）
/// - 合并/追加派生：Debug, Default
/// - 实现 `Command`（NAME）与 `CommandLayout`（属性列表、关联标识读写）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as TypeAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[graphql_command] only on struct")
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

    let id_ty: syn::Type = syn::parse_quote! { ::std::option::Option<::std::string::String> };
    ensure_required_fields(fields_named, &[(CLIENT_MUTATION_ID, &id_ty)]);

    let fields = match collect_fields(fields_named, &[CLIENT_MUTATION_ID]) {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    apply_derives(
        &mut st.attrs,
        vec![syn::parse_quote!(Debug), syn::parse_quote!(Default)],
    );

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let name = cfg
        .name
        .map(|lit| lit.value())
        .unwrap_or_else(|| ident.to_string());
    let description = option_str(doc_string(&st.attrs).as_deref());

    let properties = fields.iter().filter(|f| !f.skip).map(|f| {
        let field_ident = &f.ident;
        let ty = &f.ty;
        let field_name = &f.name;
        let field_description = f.description_tokens();
        quote! {
            ::ddd_graphql::layout::Property::new(
                #field_name,
                #field_description,
                <#ty as ::ddd_graphql::layout::GraphQLType>::type_descriptor(),
                |command: &Self| {
                    <#ty as ::ddd_graphql::layout::GraphQLType>::to_json(&command.#field_ident)
                },
                |command: &mut Self, value: ::ddd_graphql::__private::serde_json::Value| {
                    command.#field_ident =
                        <#ty as ::ddd_graphql::layout::GraphQLType>::from_json(value)?;
                    ::std::result::Result::Ok(())
                },
            )
        }
    });

    let expanded = quote! {
        #st

        impl #impl_generics ::ddd_graphql::command::Command for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
        }

        impl #impl_generics ::ddd_graphql::command::CommandLayout for #ident #ty_generics #where_clause {
            const DESCRIPTION: ::std::option::Option<&'static str> = #description;

            fn properties() -> ::std::vec::Vec<::ddd_graphql::layout::Property<Self>> {
                ::std::vec![#(#properties),*]
            }

            fn client_mutation_id(&self) -> ::std::option::Option<&str> {
                self.client_mutation_id.as_deref()
            }

            fn set_client_mutation_id(
                &mut self,
                client_mutation_id: ::std::option::Option<::std::string::String>,
            ) {
                self.client_mutation_id = client_mutation_id;
            }
        }
    };

    TokenStream::from(expanded)
}
