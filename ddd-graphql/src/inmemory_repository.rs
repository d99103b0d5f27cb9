use crate::{
    command::GraphQLCommand,
    error::RepositoryError,
    layout,
    repository::{CommandHandler, Repository},
};
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::{Any, TypeId, type_name};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxAnySend = Box<dyn Any + Send>;

type PublishFuture = Pin<Box<dyn Future<Output = Result<BoxAnySend, RepositoryError>> + Send>>;

type PublishFn = Arc<dyn Fn(BoxAnySend) -> PublishFuture + Send + Sync>;

/// 基于内存的 Repository 实现
/// - 通过 TypeId 注册不同命令对应的 Handler
/// - 运行时以类型擦除（Any）方式调度，并在调用端还原结果
/// - 处理成功的命令按顺序追加到日志（journal），被拒绝的命令不入日志
pub struct InMemoryRepository {
    handlers: DashMap<TypeId, (&'static str, PublishFn)>,
    journal: Mutex<Vec<JournalEntry>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
            journal: Mutex::new(Vec::new()),
        }
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), RepositoryError>
    where
        C: GraphQLCommand,
        H: CommandHandler<C> + 'static,
    {
        let slot = match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => {
                return Err(RepositoryError::AlreadyRegistered { command: C::NAME });
            }
            Entry::Vacant(slot) => slot,
        };

        let f: PublishFn = Arc::new(move |boxed_cmd| {
            let handler = handler.clone();

            Box::pin(async move {
                // 正常情况下这里的 downcast 永远不会失败（键与闭包同一泛型 C）
                match boxed_cmd.downcast::<C>() {
                    Ok(cmd) => {
                        let result = handler.handle(*cmd).await?;
                        Ok(Box::new(result) as BoxAnySend)
                    }
                    Err(_) => Err(RepositoryError::TypeMismatch {
                        expected: C::NAME,
                        found: "unknown",
                    }),
                }
            })
        });

        slot.insert((C::NAME, f));
        tracing::debug!(command = C::NAME, "command handler registered");

        Ok(())
    }

    /// 获取已注册的命令名列表（只读视图）
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| e.value().0).collect()
    }

    /// 已接受命令的日志快照（按发布顺序）
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal.lock().clone()
    }

    fn append(
        &self,
        command: &'static str,
        client_mutation_id: Option<String>,
        properties: Map<String, Value>,
    ) {
        let mut journal = self.journal.lock();
        let entry = JournalEntry::builder()
            .sequence(journal.len() as u64 + 1)
            .command(command)
            .maybe_client_mutation_id(client_mutation_id)
            .properties(properties)
            .recorded_at(Utc::now())
            .build();
        journal.push(entry);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    type Error = RepositoryError;

    async fn publish<C>(&self, command: C) -> Result<C::Result, RepositoryError>
    where
        C: GraphQLCommand,
    {
        let Some(f) = self
            .handlers
            .get(&TypeId::of::<C>())
            .map(|h| h.value().1.clone())
        else {
            return Err(RepositoryError::HandlerNotFound(C::NAME));
        };

        let client_mutation_id = command.client_mutation_id().map(str::to_string);
        let properties = layout::capture(&command)?;

        let out = (f)(Box::new(command)).await?;

        let result = out
            .downcast::<C::Result>()
            .map_err(|_| RepositoryError::TypeMismatch {
                expected: type_name::<C::Result>(),
                found: "unknown",
            })?;

        self.append(C::NAME, client_mutation_id, properties);

        Ok(*result)
    }
}

/// 日志条目：一次被接受的命令
#[derive(Builder, Clone, Debug, PartialEq, Serialize)]
pub struct JournalEntry {
    /// 从 1 开始的递增序号
    sequence: u64,
    command: &'static str,
    client_mutation_id: Option<String>,
    /// 命令属性快照（GraphQL 字段名 -> 值）
    properties: Map<String, Value>,
    recorded_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn client_mutation_id(&self) -> Option<&str> {
        self.client_mutation_id.as_deref()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn recorded_at(&self) -> &DateTime<Utc> {
        &self.recorded_at
    }
}
