use crate::utils::{camel_case, doc_string};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{FieldsNamed, Ident, LitStr, Result as SynResult, Type};

/// 参与布局的字段
pub(crate) struct LayoutField {
    pub ident: Ident,
    pub ty: Type,
    pub name: String,
    pub description: Option<String>,
    pub skip: bool,
}

impl LayoutField {
    pub fn description_tokens(&self) -> TokenStream2 {
        option_str(self.description.as_deref())
    }
}

pub(crate) fn option_str(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(text) => quote! { ::std::option::Option::Some(#text) },
        None => quote! { ::std::option::Option::None },
    }
}

/// 收集字段布局并移除字段上的 `#[graphql(...)]` 属性
///
/// 字段属性：
/// - `#[graphql(name = "...")]` 覆写 GraphQL 字段名（默认 camelCase）
/// - `#[graphql(skip)]` 不参与布局，反序列化时取 `Default`
pub(crate) fn collect_fields(
    fields_named: &mut FieldsNamed,
    exclude: &[&str],
) -> SynResult<Vec<LayoutField>> {
    let mut out = Vec::new();

    for field in fields_named.named.iter_mut() {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new(field.span(), "expected a named field"));
        };

        let mut name: Option<LitStr> = None;
        let mut skip = false;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("graphql")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    if name.is_some() {
                        return Err(meta.error("duplicate key 'name' in attribute"));
                    }
                    name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown key in attribute; expected 'name' or 'skip'"))
                }
            })?;
        }
        field.attrs.retain(|a| !a.path().is_ident("graphql"));

        let raw = ident.unraw().to_string();
        if exclude.contains(&raw.as_str()) {
            continue;
        }

        out.push(LayoutField {
            name: name
                .map(|lit| lit.value())
                .unwrap_or_else(|| camel_case(&raw)),
            description: doc_string(&field.attrs),
            ty: field.ty.clone(),
            ident,
            skip,
        });
    }

    Ok(out)
}
