//! Schema 装配（MutationSchema）
//!
//! 启动阶段单线程执行：逐个注册命令类型、推导 mutation 字段、合并共享的嵌套类型，
//! 最终生成可直接服务的 `async_graphql::dynamic::Schema`。
//! 每个请求执行时包装一个新的 `ExecutionContext`。
//!
use crate::{
    command::GraphQLCommand,
    context::ExecutionContext,
    dispatcher::UnknownFieldPolicy,
    error::SchemaError,
    layout::ObjectDescriptor,
    mutation::{MutationField, MutationShape},
    repository::Repository,
    type_mapper,
};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, Schema, TypeRef};
use async_graphql::{Request, Response, Value as GraphQLValue};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// 默认查询根上列出 mutation 名称的字段
pub const MUTATIONS_FIELD: &str = "mutations";

/// Schema 装配配置
#[derive(Debug, Clone)]
pub struct MutationSchemaConfig {
    /// 查询根类型名
    pub query_type: String,
    /// 变更根类型名
    pub mutation_type: String,
    /// 输入中出现未声明字段时的处理策略
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for MutationSchemaConfig {
    fn default() -> Self {
        Self {
            query_type: "Query".to_string(),
            mutation_type: "Mutation".to_string(),
            unknown_fields: UnknownFieldPolicy::Ignore,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TypeKind {
    Input,
    Output,
    Payload,
}

type DeriveFn = fn(UnknownFieldPolicy) -> Result<MutationField, SchemaError>;

struct Registration {
    shape: MutationShape,
    derive: DeriveFn,
}

/// Schema 构建器
pub struct MutationSchemaBuilder<R> {
    repository: Arc<R>,
    config: MutationSchemaConfig,
    query: Option<Object>,
    types: HashMap<String, (TypeKind, ObjectDescriptor)>,
    mutations: HashMap<String, TypeId>,
    registrations: Vec<Registration>,
}

impl<R: Repository> MutationSchemaBuilder<R> {
    fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            config: MutationSchemaConfig::default(),
            query: None,
            types: HashMap::new(),
            mutations: HashMap::new(),
            registrations: Vec::new(),
        }
    }

    pub fn config(&mut self, config: MutationSchemaConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// 自定义查询根（替换默认的 `mutations` 列表），类型名须为 `config.query_type`
    pub fn query(&mut self, query: Object) -> &mut Self {
        self.query = Some(query);
        self
    }

    /// 注册命令类型
    ///
    /// 同一命令类型重复注册不产生任何变化；失败时构建器保持注册前的状态。
    pub fn register<C: GraphQLCommand>(&mut self) -> Result<&mut Self, SchemaError> {
        let key = TypeId::of::<C>();

        match self.mutations.get(C::NAME) {
            Some(existing) if *existing == key => {
                tracing::debug!(command = C::NAME, "command already registered, skipping");
                return Ok(self);
            }
            Some(_) => {
                return Err(SchemaError::DuplicateMutation {
                    name: C::NAME.to_string(),
                });
            }
            None => {}
        }

        let derive: DeriveFn = MutationField::derive::<C, R>;
        let field = derive(self.config.unknown_fields)?;
        let shape = field.shape().clone();

        let mut staged: Vec<(TypeKind, ObjectDescriptor)> = Vec::new();
        for (index, object) in type_mapper::object_closure(shape.payload())
            .into_iter()
            .enumerate()
        {
            let kind = if index == 0 {
                TypeKind::Payload
            } else {
                TypeKind::Output
            };
            staged.push((kind, object));
        }
        for object in type_mapper::object_closure(shape.input()) {
            staged.push((TypeKind::Input, object));
        }

        let mut fresh: HashMap<String, (TypeKind, ObjectDescriptor)> = HashMap::new();
        for (kind, object) in staged {
            let known = self
                .types
                .get(object.name())
                .or_else(|| fresh.get(object.name()));
            match known {
                Some((known_kind, known_object)) => {
                    if *known_kind != kind || *known_object != object {
                        return Err(SchemaError::ConflictingType {
                            name: object.name().to_string(),
                        });
                    }
                }
                None => {
                    fresh.insert(object.name().to_string(), (kind, object));
                }
            }
        }

        tracing::debug!(
            command = C::NAME,
            new_types = fresh.len(),
            "mutation registered"
        );

        self.types.extend(fresh);
        self.mutations.insert(C::NAME.to_string(), key);
        self.registrations.push(Registration { shape, derive });

        Ok(self)
    }

    /// 生成 schema
    pub fn finish(self) -> Result<MutationSchema<R>, SchemaError> {
        if self.registrations.is_empty() {
            return Err(SchemaError::Empty);
        }

        let config = self.config;
        for root in [&config.query_type, &config.mutation_type] {
            if self.types.contains_key(root) {
                return Err(SchemaError::ConflictingType { name: root.clone() });
            }
        }

        let names: Vec<String> = self
            .registrations
            .iter()
            .map(|r| r.shape.name().to_string())
            .collect();

        let query = match self.query {
            Some(query) => query,
            None => default_query(&config.query_type, names.clone()),
        };

        let mut mutation = Object::new(&config.mutation_type);
        let mut shapes = Vec::with_capacity(self.registrations.len());
        for registration in self.registrations {
            let (shape, field) = (registration.derive)(config.unknown_fields)?.into_parts();
            mutation = mutation.field(field);
            shapes.push(shape);
        }

        let mut builder = Schema::build(
            &config.query_type,
            Some(config.mutation_type.as_str()),
            None,
        )
        .register(query)
        .register(mutation);

        // 按名称排序，保证注册顺序确定
        let mut types: Vec<(String, (TypeKind, ObjectDescriptor))> =
            self.types.into_iter().collect();
        types.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, (kind, object)) in types {
            builder = match kind {
                TypeKind::Input => builder.register(type_mapper::build_input_object(&object)),
                TypeKind::Output => {
                    builder.register(type_mapper::build_output_object(&object, false))
                }
                TypeKind::Payload => {
                    builder.register(type_mapper::build_output_object(&object, true))
                }
            };
        }

        let schema = builder.finish().map_err(|e| SchemaError::Build {
            reason: e.to_string(),
        })?;

        tracing::info!(mutations = names.len(), "mutation schema assembled");

        Ok(MutationSchema {
            schema,
            repository: self.repository,
            shapes,
        })
    }
}

fn default_query(type_name: &str, names: Vec<String>) -> Object {
    let names = Arc::new(names);
    Object::new(type_name).field(Field::new(
        MUTATIONS_FIELD,
        TypeRef::named_nn_list_nn(TypeRef::STRING),
        move |_| {
            let names = Arc::clone(&names);
            FieldFuture::new(async move {
                let list = names
                    .iter()
                    .map(|name| GraphQLValue::String(name.clone()))
                    .collect();
                Ok(Some(FieldValue::value(GraphQLValue::List(list))))
            })
        },
    ))
}

/// 可服务的 mutation schema
pub struct MutationSchema<R> {
    schema: Schema,
    repository: Arc<R>,
    shapes: Vec<MutationShape>,
}

impl<R: Repository> MutationSchema<R> {
    pub fn builder(repository: Arc<R>) -> MutationSchemaBuilder<R> {
        MutationSchemaBuilder::new(repository)
    }

    /// 以新的执行上下文执行请求
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let context = ExecutionContext::new(Arc::clone(&self.repository));
        self.execute_with(request, context).await
    }

    /// 以调用方提供的执行上下文执行请求（便于请求结束后读取命令槽）
    pub async fn execute_with(
        &self,
        request: impl Into<Request>,
        context: ExecutionContext<R>,
    ) -> Response {
        let request = request.into().data(context);
        self.schema.execute(request).await
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// 已注册 mutation 的形状，按注册顺序
    pub fn shapes(&self) -> &[MutationShape] {
        &self.shapes
    }

    /// 内部 dynamic schema，供传输层（HTTP / WebSocket）使用
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }
}
