//! 统一错误定义
//!
//! 按生命周期划分：
//! - `SchemaError`：schema 推导期错误，只会在启动装配阶段出现，应阻止服务启动；
//! - `MutationError`：单次 mutation 调用的错误，转换为该字段的 GraphQL 错误；
//! - `DomainError` / `RepositoryError`：命令处理器与内存仓储的错误，经发布环节原样转发。
//!
use async_graphql::ErrorExtensions;
use thiserror::Error;

/// 发布失败时携带的原始错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// schema 推导错误（启动期致命）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("field `clientMutationId` is reserved: type={type_name}")]
    CorrelationFieldCollision { type_name: String },

    #[error("invalid graphql name: `{name}` in {owner}")]
    InvalidName { owner: String, name: String },

    #[error("duplicate field: `{name}` in {owner}")]
    DuplicateField { owner: String, name: String },

    #[error("conflicting type definition: {name}")]
    ConflictingType { name: String },

    #[error("mutation already registered by another command: {name}")]
    DuplicateMutation { name: String },

    #[error("no mutation registered")]
    Empty,

    #[error("schema build failed: {reason}")]
    Build { reason: String },
}

/// 单次 mutation 调用错误
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("invalid input: command={command}, reason={reason}")]
    InvalidInput {
        command: &'static str,
        reason: String,
    },

    #[error("binding failed: command={command}, property={property}: {source}")]
    Binding {
        command: &'static str,
        property: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown input field: command={command}, field={field}")]
    UnknownField {
        command: &'static str,
        field: String,
    },

    #[error("validation: {0}")]
    Validation(String),

    #[error("{source}")]
    Publish {
        command: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("result serialization failed: command={command}: {source}")]
    Serialization {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("execution context missing for request")]
    MissingContext,
}

impl MutationError {
    /// 稳定的错误码，写入 GraphQL 错误的 `code` 扩展字段
    pub fn code(&self) -> &'static str {
        match self {
            MutationError::InvalidInput { .. }
            | MutationError::Binding { .. }
            | MutationError::UnknownField { .. } => "BAD_USER_INPUT",
            MutationError::Validation(_) => "VALIDATION_FAILED",
            MutationError::Publish { .. } => "PUBLISH_FAILED",
            MutationError::Serialization { .. } | MutationError::MissingContext => {
                "INTERNAL_ERROR"
            }
        }
    }
}

impl ErrorExtensions for MutationError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", code.to_string()))
    }
}

/// 命令处理器可返回的领域错误
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },
    #[error("version conflict: expected={expected}, actual={actual}")]
    VersionConflict { expected: usize, actual: usize },
    #[error("repository error: {reason}")]
    Repository { reason: String },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

/// 内存仓储错误
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error("handler already registered: command={command}")]
    AlreadyRegistered { command: &'static str },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
