use crate::{command::GraphQLCommand, layout, repository::Repository};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// 执行上下文（Execution Context）
///
/// 每个入站 GraphQL 请求对应一个实例，是请求间隔离的单位，不得在并发请求间共享：
/// - 仓储句柄（`repository`）：调度器通过它发布命令；
/// - 当前命令槽（`command`）：记录本请求中正在执行的命令快照，发布前写入。
///
/// 克隆得到的是同一个上下文的句柄（共享命令槽），便于调用方在请求结束后读取。
///
/// ```rust
/// use ddd_graphql::context::ExecutionContext;
/// use ddd_graphql::InMemoryRepository;
/// use std::sync::Arc;
///
/// let ctx = ExecutionContext::new(Arc::new(InMemoryRepository::new()));
/// assert!(ctx.command().is_none());
/// ```
pub struct ExecutionContext<R> {
    repository: Arc<R>,
    command: Arc<Mutex<Option<CurrentCommand>>>,
}

impl<R> Clone for ExecutionContext<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            command: Arc::clone(&self.command),
        }
    }
}

impl<R: Repository> ExecutionContext<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            command: Arc::new(Mutex::new(None)),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// 当前（或最近一次）执行的命令快照
    pub fn command(&self) -> Option<CurrentCommand> {
        self.command.lock().clone()
    }

    pub fn set_command(&self, command: CurrentCommand) {
        *self.command.lock() = Some(command);
    }

    pub fn clear_command(&self) -> Option<CurrentCommand> {
        self.command.lock().take()
    }
}

/// 已装配命令的快照
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentCommand {
    name: &'static str,
    client_mutation_id: Option<String>,
    properties: Map<String, Value>,
}

impl CurrentCommand {
    pub fn capture<C: GraphQLCommand>(command: &C) -> serde_json::Result<Self> {
        Ok(Self {
            name: C::NAME,
            client_mutation_id: command.client_mutation_id().map(str::to_string),
            properties: layout::capture(command)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn client_mutation_id(&self) -> Option<&str> {
        self.client_mutation_id.as_deref()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }
}
