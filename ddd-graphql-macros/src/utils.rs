use quote::ToTokens;
use syn::{Attribute, Expr, Field, FieldsNamed, Lit, Meta, Token, Type, punctuated::Punctuated};

// 提取非 derive 属性与已有 derive 列表
pub(crate) fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) =
                attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
            {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 合并默认与已有 derive（去重，优先保留 required）
pub(crate) fn merge_derives(existing: Vec<syn::Path>, required: Vec<syn::Path>) -> Attribute {
    let mut seen = std::collections::HashSet::<String>::new();
    let mut final_list: Vec<syn::Path> = Vec::new();
    for p in required.into_iter().chain(existing) {
        if seen.insert(derive_key(&p)) {
            final_list.push(p);
        }
    }
    syn::parse_quote!(#[derive(#(#final_list),*)])
}

// 以路径末段作为 key，避免 Debug / std::fmt::Debug 重复
fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => last.ident.to_string(),
        None => p.to_token_stream().to_string(),
    }
}

// 直接在 attrs 上应用默认派生合并
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);
    let merged = merge_derives(existing, required);
    *attrs = std::iter::once(merged).chain(retained).collect();
}

/// 确保具名字段结构体包含所需字段：缺失时按给定顺序插入到最前，已存在则保留原位置
pub(crate) fn ensure_required_fields(fields_named: &mut FieldsNamed, required: &[(&str, &Type)]) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required.iter() {
        if !has_field_named(&old_named, name) {
            let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
            new_named.push(syn::parse_quote! { #ident: #ty });
        }
    }
    new_named.extend(old_named);

    fields_named.named = new_named;
}

pub(crate) fn has_field_named(named: &Punctuated<Field, Token![,]>, name: &str) -> bool {
    named
        .iter()
        .any(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

/// snake_case -> camelCase（保留前导下划线）
pub(crate) fn camel_case(ident: &str) -> String {
    let trimmed = ident.trim_start_matches('_');
    let mut out = "_".repeat(ident.len() - trimmed.len());
    let mut upper_next = false;
    for c in trimmed.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// 文档注释合并为描述文本；无注释时返回 None
pub(crate) fn doc_string(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_conversion() {
        assert_eq!(camel_case("new_name"), "newName");
        assert_eq!(camel_case("thing_id"), "thingId");
        assert_eq!(camel_case("age"), "age");
        assert_eq!(camel_case("_hidden_flag"), "_hiddenFlag");
        assert_eq!(camel_case("zip_code_2"), "zipCode2");
    }

    #[test]
    fn derives_are_merged_without_duplicates() {
        let mut attrs: Vec<Attribute> = vec![
            syn::parse_quote!(#[derive(Clone, std::fmt::Debug)]),
            syn::parse_quote!(#[doc = " x"]),
        ];
        apply_derives(
            &mut attrs,
            vec![syn::parse_quote!(Debug), syn::parse_quote!(Default)],
        );
        assert_eq!(attrs.len(), 2);
        let derive = attrs[0].to_token_stream().to_string().replace(' ', "");
        assert_eq!(derive, "#[derive(Debug,Default,Clone)]");
    }

    #[test]
    fn doc_lines_are_joined() {
        let attrs: Vec<Attribute> = vec![
            syn::parse_quote!(#[doc = " 第一行"]),
            syn::parse_quote!(#[doc = " 第二行 "]),
        ];
        assert_eq!(doc_string(&attrs).as_deref(), Some("第一行\n第二行"));
        assert_eq!(doc_string(&[]), None);
    }
}
