//! 布局（Layout）：编译期生成的属性描述
//!
//! 由 `#[graphql_command]` / `#[graphql_object]` 宏为类型生成有序的字段描述列表，
//! 每个条目携带名称、描述、语义类型以及读写函数指针，替代运行时反射：
//! - `GraphQLType`：Rust 类型到语义类型与 JSON 值的双向映射；
//! - `ObjectLayout`：对象类型（结果类型、嵌套对象）的字段描述；
//! - `Property`：命令上可按名称读写的单个属性。
//!
use crate::command::CommandLayout;
use serde::de::Error as _;
use serde_json::{Map, Value};
use std::fmt;

/// GraphQL 内置标量
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Boolean,
}

impl ScalarKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Boolean => "Boolean",
        }
    }
}

/// 语义类型
///
/// 未被 `Optional` 包裹的类型在 GraphQL 中均为非空类型。
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Object(ObjectDescriptor),
    List(Box<TypeDescriptor>),
    Optional(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn optional(inner: TypeDescriptor) -> Self {
        match inner {
            TypeDescriptor::Optional(_) => inner,
            other => TypeDescriptor::Optional(Box::new(other)),
        }
    }

    pub fn list(inner: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(inner))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional(_))
    }

    /// 剥离 List / Optional 包装后的具名类型
    pub fn innermost(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::List(inner) | TypeDescriptor::Optional(inner) => inner.innermost(),
            other => other,
        }
    }

    /// 具名类型的名称（标量名或对象名）
    pub fn type_name(&self) -> &str {
        match self {
            TypeDescriptor::Scalar(kind) => kind.type_name(),
            TypeDescriptor::Object(object) => object.name(),
            TypeDescriptor::List(inner) | TypeDescriptor::Optional(inner) => inner.type_name(),
        }
    }
}

/// 对象类型中的单个字段
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    description: Option<String>,
    ty: TypeDescriptor,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, description: Option<&str>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// 替换字段类型，名称与描述保持不变
    pub fn with_type(&self, ty: TypeDescriptor) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            ty,
        }
    }
}

/// 对象类型描述（输出对象或输入对象）
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDescriptor {
    name: String,
    description: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl ObjectDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: Option<&str>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// 可映射为 GraphQL 类型的 Rust 类型
///
/// JSON 键始终使用 GraphQL 字段名，与 serde 的命名配置无关。
pub trait GraphQLType: Sized + Send + Sync + 'static {
    fn type_descriptor() -> TypeDescriptor;

    fn to_json(&self) -> serde_json::Result<Value>;

    fn from_json(value: Value) -> serde_json::Result<Self>;
}

/// 对象类型：结果类型与嵌套对象
pub trait ObjectLayout: GraphQLType {
    fn object_descriptor() -> ObjectDescriptor;
}

macro_rules! scalar_type {
    ($kind:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl GraphQLType for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::Scalar(ScalarKind::$kind)
                }

                fn to_json(&self) -> serde_json::Result<Value> {
                    serde_json::to_value(self)
                }

                fn from_json(value: Value) -> serde_json::Result<Self> {
                    serde_json::from_value(value)
                }
            }
        )+
    };
}

scalar_type!(String => String);
scalar_type!(Int => i32);
scalar_type!(Boolean => bool);

/// 宽整数映射到 32 位有符号 `Int`，超出范围的值在输出时报错
macro_rules! wide_int_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl GraphQLType for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::Scalar(ScalarKind::Int)
                }

                fn to_json(&self) -> serde_json::Result<Value> {
                    i32::try_from(*self).map(Value::from).map_err(|_| {
                        serde_json::Error::custom(format!(
                            "integer {self} is out of range for Int"
                        ))
                    })
                }

                fn from_json(value: Value) -> serde_json::Result<Self> {
                    serde_json::from_value(value)
                }
            }
        )+
    };
}

wide_int_type!(i64, u32);

/// `Float` 只接受有限值
macro_rules! float_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl GraphQLType for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::Scalar(ScalarKind::Float)
                }

                fn to_json(&self) -> serde_json::Result<Value> {
                    if !self.is_finite() {
                        return Err(serde_json::Error::custom(format!(
                            "non-finite value {self} is not a valid Float"
                        )));
                    }
                    serde_json::to_value(self)
                }

                fn from_json(value: Value) -> serde_json::Result<Self> {
                    serde_json::from_value(value)
                }
            }
        )+
    };
}

float_type!(f32, f64);

impl<T: GraphQLType> GraphQLType for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::type_descriptor())
    }

    fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Some(value) => value.to_json(),
            None => Ok(Value::Null),
        }
    }

    fn from_json(value: Value) -> serde_json::Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_json(value).map(Some)
    }
}

impl<T: GraphQLType> GraphQLType for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(T::type_descriptor())
    }

    fn to_json(&self) -> serde_json::Result<Value> {
        self.iter()
            .map(GraphQLType::to_json)
            .collect::<serde_json::Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn from_json(value: Value) -> serde_json::Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_json).collect(),
            other => Err(type_error("a list", &other)),
        }
    }
}

/// 无业务数据的结果：载荷仅包含 `clientMutationId`
impl GraphQLType for () {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Object(Self::object_descriptor())
    }

    fn to_json(&self) -> serde_json::Result<Value> {
        Ok(Value::Object(Map::new()))
    }

    fn from_json(_value: Value) -> serde_json::Result<Self> {
        Ok(())
    }
}

impl ObjectLayout for () {
    fn object_descriptor() -> ObjectDescriptor {
        ObjectDescriptor::new("Unit", None, Vec::new())
    }
}

/// 命令上的单个可读写属性
pub struct Property<C> {
    name: &'static str,
    description: Option<&'static str>,
    ty: TypeDescriptor,
    getter: fn(&C) -> serde_json::Result<Value>,
    setter: fn(&mut C, Value) -> serde_json::Result<()>,
}

impl<C> Property<C> {
    pub fn new(
        name: &'static str,
        description: Option<&'static str>,
        ty: TypeDescriptor,
        getter: fn(&C) -> serde_json::Result<Value>,
        setter: fn(&mut C, Value) -> serde_json::Result<()>,
    ) -> Self {
        Self {
            name,
            description,
            ty,
            getter,
            setter,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> Option<&'static str> {
        self.description
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn is_optional(&self) -> bool {
        self.ty.is_optional()
    }

    /// 该属性在命令对象类型中的字段描述
    pub fn field(&self) -> FieldDescriptor {
        FieldDescriptor::new(self.name, self.description, self.ty.clone())
    }

    pub fn get(&self, command: &C) -> serde_json::Result<Value> {
        (self.getter)(command)
    }

    /// 写入属性；`null` 写入可选属性得到 `None`，写入非可选属性返回错误
    pub fn set(&self, command: &mut C, value: Value) -> serde_json::Result<()> {
        (self.setter)(command, value)
    }
}

impl<C> fmt::Debug for Property<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

/// 按属性名快照命令的全部属性
pub fn capture<C: CommandLayout>(command: &C) -> serde_json::Result<Map<String, Value>> {
    let mut out = Map::new();
    for property in C::properties() {
        out.insert(property.name().to_string(), property.get(command)?);
    }
    Ok(out)
}

/// GraphQL 名称规则：`[_A-Za-z][_0-9A-Za-z]*`，且不得以 `__` 开头（保留给内省）
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_ascii_alphabetic()) || name.starts_with("__") {
        return false;
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[doc(hidden)]
pub fn expect_object(value: Value, type_name: &str) -> serde_json::Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(type_error(&format!("object `{type_name}`"), &other)),
    }
}

#[doc(hidden)]
pub fn take_field(map: &mut Map<String, Value>, name: &str) -> Value {
    map.remove(name).unwrap_or(Value::Null)
}

fn type_error(expected: &str, found: &Value) -> serde_json::Error {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    };
    serde_json::Error::custom(format!("invalid type: {found}, expected {expected}"))
}
