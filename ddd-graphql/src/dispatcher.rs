//! Mutation 调度器（MutationDispatcher）
//!
//! 将一次 mutation 调用装配为命令并发布：
//! 1. 创建全新的命令实例（`Default`）；
//! 2. 读取 `clientMutationId` 并按属性名逐一绑定 `input` 中的值；
//! 3. 调用 `before_publishing` 扩展点；
//! 4. 记录当前命令快照到执行上下文；
//! 5. 发布到仓储并等待结果（唯一的挂起点）。
//!
use crate::{
    command::GraphQLCommand,
    context::{CurrentCommand, ExecutionContext},
    error::MutationError,
    layout::GraphQLType,
    repository::Repository,
    type_mapper::CLIENT_MUTATION_ID,
};
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// 输入中出现未声明字段时的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// 忽略（记录 debug 日志）
    #[default]
    Ignore,
    /// 作为绑定错误拒绝
    Reject,
}

/// mutation 解析结果：结果数据与关联标识一同下传给载荷字段解析器
#[derive(Clone, Debug, PartialEq)]
pub struct MutationPayload {
    client_mutation_id: Option<String>,
    data: Value,
}

impl MutationPayload {
    pub fn client_mutation_id(&self) -> Option<&str> {
        self.client_mutation_id.as_deref()
    }

    /// 结果类型按 GraphQL 字段名序列化后的 JSON
    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// 单个命令类型的调度器，无请求级状态，可在并发请求间共享
pub struct MutationDispatcher<C, R> {
    policy: UnknownFieldPolicy,
    _marker: PhantomData<fn() -> (C, R)>,
}

impl<C, R> MutationDispatcher<C, R>
where
    C: GraphQLCommand,
    R: Repository,
{
    pub fn new(policy: UnknownFieldPolicy) -> Self {
        Self {
            policy,
            _marker: PhantomData,
        }
    }

    /// 由 `input` 值装配新的命令实例
    ///
    /// - 缺失的属性按 `null` 绑定：可选属性得到 `None`，非可选属性返回绑定错误；
    /// - 绑定失败时半装配的实例直接丢弃。
    pub fn bind(&self, input: Value) -> Result<C, MutationError> {
        let mut input = match input {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(MutationError::InvalidInput {
                    command: C::NAME,
                    reason: format!("expected an object, found {other}"),
                });
            }
        };

        let mut command = C::default();

        let client_mutation_id = match input.remove(CLIENT_MUTATION_ID) {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id),
            Some(other) => {
                return Err(MutationError::InvalidInput {
                    command: C::NAME,
                    reason: format!("`{CLIENT_MUTATION_ID}` must be a string, found {other}"),
                });
            }
        };
        command.set_client_mutation_id(client_mutation_id);

        for property in C::properties() {
            let value = input.remove(property.name()).unwrap_or(Value::Null);
            property
                .set(&mut command, value)
                .map_err(|source| MutationError::Binding {
                    command: C::NAME,
                    property: property.name(),
                    source,
                })?;
        }

        // 剩余的键不对应任何属性
        if let Some(field) = input.keys().next() {
            match self.policy {
                UnknownFieldPolicy::Reject => {
                    return Err(MutationError::UnknownField {
                        command: C::NAME,
                        field: field.clone(),
                    });
                }
                UnknownFieldPolicy::Ignore => {
                    tracing::debug!(
                        command = C::NAME,
                        fields = ?input.keys().collect::<Vec<_>>(),
                        "ignoring unknown input fields"
                    );
                }
            }
        }

        Ok(command)
    }

    /// 装配、发布命令并返回载荷
    pub async fn mutate(
        &self,
        context: &ExecutionContext<R>,
        input: Value,
    ) -> Result<MutationPayload, MutationError> {
        // 同一请求中的上一个命令已结束，任何失败路径都不得遗留它
        context.clear_command();

        let mut command = self.bind(input).inspect_err(|err| {
            tracing::warn!(command = C::NAME, error = %err, "mutation input rejected");
        })?;

        let client_mutation_id = command.client_mutation_id().map(str::to_string);
        tracing::debug!(
            command = C::NAME,
            client_mutation_id = client_mutation_id.as_deref(),
            "dispatching mutation"
        );

        command.before_publishing().inspect_err(|err| {
            tracing::warn!(command = C::NAME, error = %err, "command rejected before publishing");
        })?;

        let snapshot =
            CurrentCommand::capture(&command).map_err(|source| MutationError::Serialization {
                command: C::NAME,
                source,
            })?;
        context.set_command(snapshot);

        let result = match context.repository().publish(command).await {
            Ok(result) => result,
            Err(err) => {
                context.clear_command();
                tracing::warn!(
                    command = C::NAME,
                    client_mutation_id = client_mutation_id.as_deref(),
                    error = %err,
                    "publish failed"
                );
                return Err(MutationError::Publish {
                    command: C::NAME,
                    source: Box::new(err),
                });
            }
        };

        let data = result
            .to_json()
            .map_err(|source| MutationError::Serialization {
                command: C::NAME,
                source,
            })?;

        Ok(MutationPayload {
            client_mutation_id,
            data,
        })
    }
}
