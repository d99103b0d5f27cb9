use crate::error::MutationError;
use crate::layout::{ObjectLayout, Property};

/// 命令（Command）
///
/// 表达“意图”的写操作请求，发布到事件溯源仓储后改变领域状态。
/// - 每次调用都会创建新的实例，实例从不复用；
/// - 建议保持语义化的“动宾结构”命名，如 `RenameThing`、`CloseOrder`。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，同时作为 mutation 字段名与载荷类型名。避免依赖 `type_name::<T>()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;
}

/// 命令布局：由 `#[graphql_command]` 生成
///
/// 列出命令可按名称写入的属性，并读写关联标识 `clientMutationId`。
pub trait CommandLayout: Sized {
    /// 命令描述（取自文档注释）
    const DESCRIPTION: Option<&'static str> = None;

    /// 按声明顺序列出属性（不含 `clientMutationId`），多次调用结果一致
    fn properties() -> Vec<Property<Self>>;

    fn client_mutation_id(&self) -> Option<&str>;

    fn set_client_mutation_id(&mut self, client_mutation_id: Option<String>);
}

/// 可作为 GraphQL mutation 暴露的命令
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
pub trait GraphQLCommand: Command + CommandLayout + Default {
    /// 仓储发布完成后返回的结果类型
    type Result: ObjectLayout;

    /// 发布前的扩展点：可在此做最后的转换或校验，返回错误则放弃发布
    fn before_publishing(&mut self) -> Result<(), MutationError> {
        Ok(())
    }
}
