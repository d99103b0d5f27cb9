use syn::punctuated::Punctuated;
use syn::{Ident, LitStr, Result as SynResult, Token, parse::Parse, parse::ParseStream};

// 解析宏参数：name = "..."
pub(crate) struct TypeAttrConfig {
    pub name: Option<LitStr>,
}

impl Parse for TypeAttrConfig {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let mut name: Option<LitStr> = None;

        if input.is_empty() {
            return Ok(Self { name });
        }

        let pairs: Punctuated<KvStr, Token![,]> =
            Punctuated::<KvStr, Token![,]>::parse_terminated(input)?;

        for kv in pairs.into_iter() {
            match kv.key.to_string().as_str() {
                "name" => {
                    if name.is_some() {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "duplicate key 'name' in attribute",
                        ));
                    }
                    name = Some(kv.value);
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key in attribute; expected 'name'",
                    ));
                }
            }
        }

        Ok(Self { name })
    }
}

struct KvStr {
    key: Ident,
    value: LitStr,
}

impl Parse for KvStr {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: LitStr = input.parse()?;
        Ok(Self { key, value })
    }
}
