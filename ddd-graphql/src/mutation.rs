//! Mutation 字段构建（MutationField）
//!
//! 每个命令类型对应一个 mutation 字段：
//! - 字段名取命令名，唯一参数 `input: <Name>Input!`；
//! - 返回类型 `<Name>!`，即结果类型字段 + `clientMutationId`；
//! - 解析器绑定到该命令的 `MutationDispatcher::mutate`。
//!
//! 字段在 schema 装配阶段一次性构建，之后只读，可被任意并发请求共享。
//!
use crate::{
    command::GraphQLCommand,
    context::ExecutionContext,
    dispatcher::{MutationDispatcher, UnknownFieldPolicy},
    error::{MutationError, SchemaError},
    layout::ObjectDescriptor,
    repository::Repository,
    type_mapper,
};
use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, TypeRef};
use std::sync::Arc;

/// `input` 参数名
pub const INPUT_ARGUMENT: &str = "input";

/// mutation 字段的结构形状，可比较相等
#[derive(Clone, Debug, PartialEq)]
pub struct MutationShape {
    name: String,
    argument: &'static str,
    input: ObjectDescriptor,
    payload: ObjectDescriptor,
}

impl MutationShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument(&self) -> &'static str {
        self.argument
    }

    pub fn input(&self) -> &ObjectDescriptor {
        &self.input
    }

    pub fn payload(&self) -> &ObjectDescriptor {
        &self.payload
    }
}

/// 已推导的 mutation 字段定义
pub struct MutationField {
    shape: MutationShape,
    field: Field,
}

impl MutationField {
    /// 为命令类型 `C` 推导 mutation 字段
    pub fn derive<C, R>(policy: UnknownFieldPolicy) -> Result<Self, SchemaError>
    where
        C: GraphQLCommand,
        R: Repository,
    {
        let object = type_mapper::command_object::<C>()?;
        let payload = type_mapper::payload_object::<C>()?;
        let input = type_mapper::input_descriptor(&object);

        let dispatcher = Arc::new(MutationDispatcher::<C, R>::new(policy));

        let mut field = Field::new(object.name(), TypeRef::named_nn(payload.name()), move |ctx| {
            let dispatcher = Arc::clone(&dispatcher);
            FieldFuture::new(async move {
                let input = ctx.args.try_get(INPUT_ARGUMENT)?.as_value().clone().into_json()?;
                let context = ctx
                    .data::<ExecutionContext<R>>()
                    .map_err(|_| MutationError::MissingContext.extend())?;

                let payload = dispatcher
                    .mutate(context, input)
                    .await
                    .map_err(|err| err.extend())?;

                Ok(Some(FieldValue::owned_any(payload)))
            })
        })
        .argument(InputValue::new(
            INPUT_ARGUMENT,
            TypeRef::named_nn(input.name()),
        ));
        if let Some(description) = object.description() {
            field = field.description(description);
        }

        let shape = MutationShape {
            name: object.name().to_string(),
            argument: INPUT_ARGUMENT,
            input,
            payload,
        };

        Ok(Self { shape, field })
    }

    pub fn shape(&self) -> &MutationShape {
        &self.shape
    }

    pub fn into_parts(self) -> (MutationShape, Field) {
        (self.shape, self.field)
    }
}
