//! 命令到 GraphQL Mutation 的桥接库（ddd-graphql）
//!
//! 将事件溯源仓储中的“命令”（意图写操作）自动映射为 GraphQL mutation 字段，
//! 无需手写解析器：
//! - 由命令声明的属性推导输入类型（`<Name>Input`）；
//! - 由命令声明的结果类型推导载荷类型，并追加 `clientMutationId` 关联字段；
//! - 将一次 mutation 调用装配为新的命令实例，发布到仓储并在异步结果完成后返回载荷。
//!
//! 典型用法：
//! 1. 使用 `#[graphql_command]` / `#[graphql_object]`（见 `ddd-graphql-macros`）声明命令与结果；
//! 2. 为命令实现 [`GraphQLCommand`](crate::command::GraphQLCommand)，指定结果类型；
//! 3. 提供 [`Repository`](crate::repository::Repository) 实现（或使用内存实现）；
//! 4. 通过 [`MutationSchema::builder`](crate::schema::MutationSchema::builder) 注册命令并构建 schema。
//!
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod inmemory_repository;
pub mod layout;
pub mod mutation;
pub mod repository;
pub mod schema;
pub mod type_mapper;

pub use inmemory_repository::InMemoryRepository;
pub use schema::{MutationSchema, MutationSchemaBuilder, MutationSchemaConfig};

// 允许在本 crate 内部通过 ::ddd_graphql 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::ddd_graphql 路径。
extern crate self as ddd_graphql;

/// 过程宏生成代码所依赖的内部路径，不属于公开 API
#[doc(hidden)]
pub mod __private {
    pub use crate::layout::{expect_object, take_field};
    pub use serde_json;
}
