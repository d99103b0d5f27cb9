use proc_macro::TokenStream;

mod field_utils;
mod graphql_command;
mod graphql_object;
mod type_attr;
mod utils;

/// 命令宏
/// - 追加字段：`client_mutation_id: Option<String>`（若缺失）并置于字段最前
/// - 自动派生 `Debug`、`Default`
/// - 实现 `::ddd_graphql::command::Command` 与 `::ddd_graphql::command::CommandLayout`
/// - 支持参数：`#[graphql_command(name = "...")]`，默认取结构体名
///
/// 字段名默认转换为 camelCase，可用 `#[graphql(name = "...")]` 覆写，
/// `#[graphql(skip)]` 排除字段；文档注释作为 GraphQL 描述。
///
/// 结果类型仍需手动实现 `GraphQLCommand`：
///
/// ```ignore
/// #[graphql_command]
/// struct RenameThing {
///     new_name: String,
/// }
///
/// impl GraphQLCommand for RenameThing {
///     type Result = ThingRenamed;
/// }
/// ```
#[proc_macro_attribute]
pub fn graphql_command(attr: TokenStream, item: TokenStream) -> TokenStream {
    graphql_command::expand(attr, item)
}

/// 对象宏：用于命令结果类型与嵌套对象
/// - 自动派生 `Debug`、`Clone`、`Default`、`PartialEq`
/// - 实现 `::ddd_graphql::layout::GraphQLType` 与 `::ddd_graphql::layout::ObjectLayout`
/// - 支持参数：`#[graphql_object(name = "...")]`，默认取结构体名
#[proc_macro_attribute]
pub fn graphql_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    graphql_object::expand(attr, item)
}
