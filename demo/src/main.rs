use async_graphql::{Request, Variables};
use async_trait::async_trait;
use ddd_graphql::command::GraphQLCommand;
use ddd_graphql::error::{DomainError, DomainResult};
use ddd_graphql::repository::CommandHandler;
use ddd_graphql::{InMemoryRepository, MutationSchema};
use ddd_graphql_macros::{graphql_command, graphql_object};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use ulid::Ulid;

#[graphql_object]
struct Location {
    label: String,
    floor: Option<i32>,
}

/// 创建物品
#[graphql_command]
struct CreateThing {
    name: String,
    tags: Vec<String>,
    location: Option<Location>,
}

#[graphql_object]
struct ThingCreated {
    thing_id: String,
}

impl GraphQLCommand for CreateThing {
    type Result = ThingCreated;

    fn before_publishing(&mut self) -> Result<(), ddd_graphql::error::MutationError> {
        self.name = self.name.trim().to_string();
        Ok(())
    }
}

/// 重命名物品
#[graphql_command]
struct RenameThing {
    thing_id: String,
    new_name: String,
}

#[graphql_object]
struct ThingRenamed {
    thing_id: String,
    previous_name: String,
}

impl GraphQLCommand for RenameThing {
    type Result = ThingRenamed;
}

#[graphql_command]
struct ArchiveThing {
    thing_id: String,
}

impl GraphQLCommand for ArchiveThing {
    type Result = ();
}

#[derive(Debug, Clone)]
struct Thing {
    name: String,
    archived: bool,
}

#[derive(Default)]
struct Things {
    inner: Mutex<HashMap<String, Thing>>,
}

impl Things {
    fn with<T>(
        &self,
        thing_id: &str,
        f: impl FnOnce(&mut Thing) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut map = self.inner.lock().map_err(|_| DomainError::Repository {
            reason: "store poisoned".into(),
        })?;
        let thing = map.get_mut(thing_id).ok_or_else(|| DomainError::NotFound {
            reason: format!("thing {thing_id}"),
        })?;
        if thing.archived {
            return Err(DomainError::InvalidState {
                reason: format!("thing {thing_id} is archived"),
            });
        }
        f(thing)
    }
}

#[async_trait]
impl CommandHandler<CreateThing> for Things {
    async fn handle(&self, command: CreateThing) -> DomainResult<ThingCreated> {
        if command.name.is_empty() {
            return Err(DomainError::InvalidCommand {
                reason: "name must not be empty".into(),
            });
        }
        let thing_id = Ulid::new().to_string();
        let mut map = self.inner.lock().map_err(|_| DomainError::Repository {
            reason: "store poisoned".into(),
        })?;
        map.insert(
            thing_id.clone(),
            Thing {
                name: command.name,
                archived: false,
            },
        );
        Ok(ThingCreated { thing_id })
    }
}

#[async_trait]
impl CommandHandler<RenameThing> for Things {
    async fn handle(&self, command: RenameThing) -> DomainResult<ThingRenamed> {
        self.with(&command.thing_id, |thing| {
            let previous_name = std::mem::replace(&mut thing.name, command.new_name);
            Ok(ThingRenamed {
                thing_id: command.thing_id.clone(),
                previous_name,
            })
        })
    }
}

#[async_trait]
impl CommandHandler<ArchiveThing> for Things {
    async fn handle(&self, command: ArchiveThing) -> DomainResult<()> {
        self.with(&command.thing_id, |thing| {
            thing.archived = true;
            Ok(())
        })
    }
}

const CREATE: &str = r#"
    mutation($input: CreateThingInput!) {
        CreateThing(input: $input) { thingId clientMutationId }
    }
"#;

const RENAME: &str = r#"
    mutation($input: RenameThingInput!) {
        RenameThing(input: $input) { thingId previousName clientMutationId }
    }
"#;

const ARCHIVE: &str = r#"
    mutation($input: ArchiveThingInput!) {
        ArchiveThing(input: $input) { clientMutationId }
    }
"#;

fn request(query: &str, input: serde_json::Value) -> Request {
    Request::new(query).variables(Variables::from_json(json!({ "input": input })))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let things = Arc::new(Things::default());
    let repo = InMemoryRepository::new();
    repo.register::<CreateThing, _>(things.clone())?;
    repo.register::<RenameThing, _>(things.clone())?;
    repo.register::<ArchiveThing, _>(things)?;

    let mut builder = MutationSchema::builder(Arc::new(repo));
    builder
        .register::<CreateThing>()?
        .register::<RenameThing>()?
        .register::<ArchiveThing>()?;
    let schema = builder.finish()?;

    println!("{}", schema.sdl());

    // 创建
    let response = schema
        .execute(request(
            CREATE,
            json!({
                "clientMutationId": "create-1",
                "name": "  Lamp ",
                "tags": ["light"],
                "location": { "label": "Office", "floor": 2 }
            }),
        ))
        .await;
    println!("create: {}", serde_json::to_string(&response)?);
    let created = response.data.into_json()?;
    let thing_id = created["CreateThing"]["thingId"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    // 重命名
    let response = schema
        .execute(request(
            RENAME,
            json!({ "clientMutationId": "rename-1", "thingId": thing_id, "newName": "Desk Lamp" }),
        ))
        .await;
    println!("rename: {}", serde_json::to_string(&response)?);

    // 归档
    let response = schema
        .execute(request(
            ARCHIVE,
            json!({ "clientMutationId": "archive-1", "thingId": thing_id }),
        ))
        .await;
    println!("archive: {}", serde_json::to_string(&response)?);

    // 归档后再次重命名：领域拒绝，返回字段错误
    let response = schema
        .execute(request(
            RENAME,
            json!({ "clientMutationId": "rename-2", "thingId": thing_id, "newName": "Lamp" }),
        ))
        .await;
    println!("rename after archive: {}", serde_json::to_string(&response)?);

    println!(
        "journal: {}",
        serde_json::to_string_pretty(&schema.repository().journal())?
    );

    Ok(())
}
