//! 类型映射（Type Mapper）
//!
//! 将布局描述转换为 GraphQL 类型：
//! - `command_object` / `payload_object`：命令对象类型与载荷类型（均追加 `clientMutationId`）；
//! - `input_descriptor`：由对象类型推导 `<Name>Input` 输入类型，递归替换嵌套对象；
//! - `build_output_object` / `build_input_object`：生成 `async_graphql::dynamic` 类型。
//!
//! 描述层的转换均为纯函数，对同一类型重复调用得到结构相等的结果。
//!
use crate::{
    command::GraphQLCommand,
    dispatcher::MutationPayload,
    error::SchemaError,
    layout::{self, FieldDescriptor, ObjectDescriptor, ObjectLayout, ScalarKind, TypeDescriptor},
};
use async_graphql::Value as GraphQLValue;
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, ResolverContext, TypeRef,
};
use std::collections::HashSet;

/// 关联标识字段名
pub const CLIENT_MUTATION_ID: &str = "clientMutationId";

/// 输入类型名后缀
pub const INPUT_SUFFIX: &str = "Input";

const CLIENT_MUTATION_ID_DESCRIPTION: &str =
    "Opaque client-supplied token echoed back in the mutation payload.";

/// 命令自身的对象类型：属性 + `clientMutationId`
pub fn command_object<C: GraphQLCommand>() -> Result<ObjectDescriptor, SchemaError> {
    let mut fields: Vec<FieldDescriptor> = C::properties().iter().map(|p| p.field()).collect();
    append_correlation_field(C::NAME, &mut fields)?;

    let object = ObjectDescriptor::new(C::NAME, C::DESCRIPTION, fields);
    validate(&object)?;
    Ok(object)
}

/// 载荷类型：以命令名命名，结果类型字段 + `clientMutationId`
pub fn payload_object<C: GraphQLCommand>() -> Result<ObjectDescriptor, SchemaError> {
    let result = <C::Result as ObjectLayout>::object_descriptor();
    let mut fields = result.fields().to_vec();
    append_correlation_field(C::NAME, &mut fields)?;

    let payload = ObjectDescriptor::new(C::NAME, result.description(), fields);
    validate(&payload)?;
    Ok(payload)
}

fn append_correlation_field(
    type_name: &str,
    fields: &mut Vec<FieldDescriptor>,
) -> Result<(), SchemaError> {
    if fields.iter().any(|f| f.name() == CLIENT_MUTATION_ID) {
        return Err(SchemaError::CorrelationFieldCollision {
            type_name: type_name.to_string(),
        });
    }

    fields.push(FieldDescriptor::new(
        CLIENT_MUTATION_ID,
        Some(CLIENT_MUTATION_ID_DESCRIPTION),
        TypeDescriptor::optional(TypeDescriptor::Scalar(ScalarKind::String)),
    ));
    Ok(())
}

/// 由对象类型推导输入类型 `<Name>Input`
///
/// 字段一一对应（保留名称与描述），对象类型字段（含 List / Optional 内部）
/// 递归替换为各自的输入类型。
pub fn input_descriptor(object: &ObjectDescriptor) -> ObjectDescriptor {
    let fields = object
        .fields()
        .iter()
        .map(|f| f.with_type(input_type(f.ty())))
        .collect();

    ObjectDescriptor::new(
        format!("{}{INPUT_SUFFIX}", object.name()),
        object.description(),
        fields,
    )
}

fn input_type(ty: &TypeDescriptor) -> TypeDescriptor {
    match ty {
        TypeDescriptor::Scalar(kind) => TypeDescriptor::Scalar(*kind),
        TypeDescriptor::Object(object) => TypeDescriptor::Object(input_descriptor(object)),
        TypeDescriptor::List(inner) => TypeDescriptor::list(input_type(inner)),
        TypeDescriptor::Optional(inner) => TypeDescriptor::optional(input_type(inner)),
    }
}

/// 根对象及其全部嵌套对象（按名称去重，根在最前）
pub fn object_closure(root: &ObjectDescriptor) -> Vec<ObjectDescriptor> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_objects(root, &mut seen, &mut out);
    out
}

fn collect_objects(
    object: &ObjectDescriptor,
    seen: &mut HashSet<String>,
    out: &mut Vec<ObjectDescriptor>,
) {
    if !seen.insert(object.name().to_string()) {
        return;
    }
    out.push(object.clone());

    for field in object.fields() {
        if let TypeDescriptor::Object(nested) = field.ty().innermost() {
            collect_objects(nested, seen, out);
        }
    }
}

/// 校验对象及其嵌套对象的名称合法且字段不重复
pub fn validate(object: &ObjectDescriptor) -> Result<(), SchemaError> {
    for object in object_closure(object) {
        if !layout::is_valid_name(object.name()) {
            return Err(SchemaError::InvalidName {
                owner: "type".to_string(),
                name: object.name().to_string(),
            });
        }

        let mut names = HashSet::new();
        for field in object.fields() {
            if !layout::is_valid_name(field.name()) {
                return Err(SchemaError::InvalidName {
                    owner: object.name().to_string(),
                    name: field.name().to_string(),
                });
            }
            if !names.insert(field.name()) {
                return Err(SchemaError::DuplicateField {
                    owner: object.name().to_string(),
                    name: field.name().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// 语义类型到 GraphQL 类型引用
pub fn type_ref(ty: &TypeDescriptor) -> TypeRef {
    match ty {
        TypeDescriptor::Optional(inner) => nullable_type_ref(inner),
        other => TypeRef::NonNull(Box::new(nullable_type_ref(other))),
    }
}

fn nullable_type_ref(ty: &TypeDescriptor) -> TypeRef {
    match ty {
        TypeDescriptor::Scalar(kind) => TypeRef::named(kind.type_name()),
        TypeDescriptor::Object(object) => TypeRef::named(object.name()),
        TypeDescriptor::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
        TypeDescriptor::Optional(inner) => nullable_type_ref(inner),
    }
}

/// 生成输入对象类型
pub fn build_input_object(object: &ObjectDescriptor) -> InputObject {
    let mut input = InputObject::new(object.name());
    if let Some(description) = object.description() {
        input = input.description(description);
    }

    for field in object.fields() {
        let mut value = InputValue::new(field.name(), type_ref(field.ty()));
        if let Some(description) = field.description() {
            value = value.description(description);
        }
        input = input.field(value);
    }
    input
}

/// 生成输出对象类型
///
/// `payload` 为 true 时该对象是 mutation 载荷：`clientMutationId` 从 `MutationPayload`
/// 读取，其余字段从结果数据读取；嵌套对象从父级 JSON 节点读取。
pub fn build_output_object(object: &ObjectDescriptor, payload: bool) -> Object {
    let mut output = Object::new(object.name());
    if let Some(description) = object.description() {
        output = output.description(description);
    }

    for field in object.fields() {
        let resolved = if payload && field.name() == CLIENT_MUTATION_ID {
            correlation_field(field)
        } else {
            member_field(field)
        };
        output = output.field(resolved);
    }
    output
}

fn correlation_field(field: &FieldDescriptor) -> Field {
    let mut out = Field::new(field.name(), type_ref(field.ty()), |ctx| {
        FieldFuture::new(async move {
            let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
            Ok(payload
                .client_mutation_id()
                .map(|id| FieldValue::value(id.to_string())))
        })
    });
    if let Some(description) = field.description() {
        out = out.description(description);
    }
    out
}

fn member_field(field: &FieldDescriptor) -> Field {
    let name = field.name().to_string();
    let ty = field.ty().clone();

    let mut out = Field::new(field.name(), type_ref(field.ty()), move |ctx| {
        let name = name.clone();
        let ty = ty.clone();
        FieldFuture::new(async move {
            let value = parent_json(&ctx)?
                .get(&name)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            to_field_value(&ty, value)
        })
    });
    if let Some(description) = field.description() {
        out = out.description(description);
    }
    out
}

fn parent_json<'a>(ctx: &ResolverContext<'a>) -> async_graphql::Result<&'a serde_json::Value> {
    let parent = ctx.parent_value;
    if let Some(payload) = parent.downcast_ref::<MutationPayload>() {
        return Ok(payload.data());
    }
    Ok(parent.try_downcast_ref::<serde_json::Value>()?)
}

fn to_field_value<'a>(
    ty: &TypeDescriptor,
    value: serde_json::Value,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    if value.is_null() {
        return Ok(None);
    }

    match ty {
        TypeDescriptor::Optional(inner) => to_field_value(inner, value),
        TypeDescriptor::Scalar(_) => Ok(Some(FieldValue::value(GraphQLValue::from_json(value)?))),
        TypeDescriptor::Object(_) => Ok(Some(FieldValue::owned_any(value))),
        TypeDescriptor::List(inner) => {
            let serde_json::Value::Array(items) = value else {
                return Err(async_graphql::Error::new(format!(
                    "expected a list for `{}`",
                    inner.type_name()
                )));
            };
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(to_field_value(inner, item)?.unwrap_or(FieldValue::NULL));
            }
            Ok(Some(FieldValue::list(values)))
        }
    }
}
