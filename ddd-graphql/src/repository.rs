use crate::{command::GraphQLCommand, error::DomainResult};
use async_trait::async_trait;

/// 事件溯源仓储（Repository）
///
/// - 接收一个已完整装配的命令实例，异步执行并返回命令声明的结果；
/// - 失败原因（校验拒绝、存储失败、冲突等）由实现自行定义，调度器只负责原样转发；
/// - 该 trait 带有泛型方法，通常以具体实现类型注入使用。
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// 发布命令
    async fn publish<C>(&self, command: C) -> Result<C::Result, Self::Error>
    where
        C: GraphQLCommand;
}

/// 命令处理器：内存仓储按命令类型路由到此
#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: GraphQLCommand,
{
    async fn handle(&self, command: C) -> DomainResult<C::Result>;
}
