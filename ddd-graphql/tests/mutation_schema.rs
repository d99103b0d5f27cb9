use anyhow::Result as AnyResult;
use async_graphql::{Request, Value, Variables};
use async_trait::async_trait;
use ddd_graphql::command::GraphQLCommand;
use ddd_graphql::context::ExecutionContext;
use ddd_graphql::error::{DomainError, DomainResult, SchemaError};
use ddd_graphql::repository::CommandHandler;
use ddd_graphql::{InMemoryRepository, MutationSchema};
use ddd_graphql_macros::{graphql_command, graphql_object};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

#[graphql_object]
struct Location {
    label: String,
    floor: Option<i32>,
}

/// 重命名物品
#[graphql_command]
struct RenameThing {
    new_name: String,
}

#[graphql_object]
struct ThingRenamed {
    thing_id: String,
}

impl GraphQLCommand for RenameThing {
    type Result = ThingRenamed;
}

#[graphql_command]
struct CreateThing {
    name: String,
    tags: Vec<String>,
    location: Option<Location>,
}

#[graphql_object]
struct ThingCreated {
    thing_id: String,
    tags: Vec<String>,
    location: Option<Location>,
}

impl GraphQLCommand for CreateThing {
    type Result = ThingCreated;
}

#[derive(Default)]
struct Things {
    names: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl CommandHandler<RenameThing> for Things {
    async fn handle(&self, command: RenameThing) -> DomainResult<ThingRenamed> {
        if command.new_name == "forbidden" {
            return Err(DomainError::InvalidState {
                reason: "name is locked".into(),
            });
        }
        self.names
            .lock()
            .unwrap()
            .insert("t-1".to_string(), command.new_name);
        Ok(ThingRenamed {
            thing_id: "t-1".to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler<CreateThing> for Things {
    async fn handle(&self, command: CreateThing) -> DomainResult<ThingCreated> {
        let mut names = self.names.lock().unwrap();
        let thing_id = format!("t-{}", names.len() + 1);
        names.insert(thing_id.clone(), command.name);
        Ok(ThingCreated {
            thing_id,
            tags: command.tags,
            location: command.location,
        })
    }
}

const RENAME: &str = r#"
    mutation Rename($input: RenameThingInput!) {
        RenameThing(input: $input) { thingId clientMutationId }
    }
"#;

const CREATE: &str = r#"
    mutation Create($input: CreateThingInput!) {
        CreateThing(input: $input) {
            thingId
            tags
            location { label floor }
            clientMutationId
        }
    }
"#;

fn schema() -> AnyResult<MutationSchema<InMemoryRepository>> {
    let things = Arc::new(Things::default());
    let repo = InMemoryRepository::new();
    repo.register::<RenameThing, _>(things.clone())?;
    repo.register::<CreateThing, _>(things)?;

    let mut builder = MutationSchema::builder(Arc::new(repo));
    builder
        .register::<RenameThing>()?
        .register::<CreateThing>()?;
    Ok(builder.finish()?)
}

fn rename(token: &str, new_name: &str) -> Request {
    Request::new(RENAME).variables(Variables::from_json(json!({
        "input": { "clientMutationId": token, "newName": new_name }
    })))
}

#[tokio::test]
async fn rename_round_trips_client_mutation_id() -> AnyResult<()> {
    let schema = schema()?;

    let response = schema.execute(rename("abc123", "Widget")).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json()?,
        json!({ "RenameThing": { "thingId": "t-1", "clientMutationId": "abc123" } })
    );

    let journal = schema.repository().journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].command(), "RenameThing");
    assert_eq!(journal[0].client_mutation_id(), Some("abc123"));
    assert_eq!(journal[0].properties().get("newName"), Some(&json!("Widget")));
    Ok(())
}

#[tokio::test]
async fn absent_client_mutation_id_resolves_to_null() -> AnyResult<()> {
    let schema = schema()?;

    let request = Request::new(RENAME).variables(Variables::from_json(json!({
        "input": { "newName": "Widget" }
    })));
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json()?,
        json!({ "RenameThing": { "thingId": "t-1", "clientMutationId": null } })
    );
    Ok(())
}

#[tokio::test]
async fn nested_and_list_values_are_bound_and_resolved() -> AnyResult<()> {
    let schema = schema()?;

    let request = Request::new(CREATE).variables(Variables::from_json(json!({
        "input": {
            "clientMutationId": "c-1",
            "name": "Lamp",
            "tags": ["light", "desk"],
            "location": { "label": "Office", "floor": null }
        }
    })));
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json()?,
        json!({
            "CreateThing": {
                "thingId": "t-1",
                "tags": ["light", "desk"],
                "location": { "label": "Office", "floor": null },
                "clientMutationId": "c-1"
            }
        })
    );
    Ok(())
}

#[tokio::test]
async fn publish_failure_is_a_field_error_and_server_keeps_serving() -> AnyResult<()> {
    let schema = schema()?;

    let response = schema.execute(rename("bad-1", "forbidden")).await;
    assert_eq!(response.data, Value::Null);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "domain: invalid state: name is locked"
    );
    let body = serde_json::to_value(&response)?;
    assert_eq!(body["errors"][0]["extensions"]["code"], json!("PUBLISH_FAILED"));

    let response = schema.execute(rename("ok-1", "Widget")).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let journal = schema.repository().journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].client_mutation_id(), Some("ok-1"));
    Ok(())
}

#[tokio::test]
async fn missing_required_input_is_rejected_by_engine() -> AnyResult<()> {
    let schema = schema()?;

    let request = Request::new(RENAME).variables(Variables::from_json(json!({
        "input": { "clientMutationId": "x" }
    })));
    let response = schema.execute(request).await;
    assert!(!response.errors.is_empty());
    assert!(schema.repository().journal().is_empty());
    Ok(())
}

#[tokio::test]
async fn default_query_lists_mutations() -> AnyResult<()> {
    let schema = schema()?;

    let response = schema.execute("{ mutations }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json()?,
        json!({ "mutations": ["RenameThing", "CreateThing"] })
    );
    Ok(())
}

#[tokio::test]
async fn execute_with_exposes_current_command() -> AnyResult<()> {
    let schema = schema()?;
    let context = ExecutionContext::new(schema.repository().clone());

    let response = schema
        .execute_with(rename("ctx-1", "Widget"), context.clone())
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let current = context.command().expect("command recorded");
    assert_eq!(current.name(), "RenameThing");
    assert_eq!(current.client_mutation_id(), Some("ctx-1"));
    assert_eq!(current.properties().get("newName"), Some(&json!("Widget")));
    Ok(())
}

const RENAME_THEN_CREATE: &str = r#"
    mutation {
        first: RenameThing(input: { clientMutationId: "first", newName: "Widget" }) {
            thingId
            clientMutationId
        }
        second: CreateThing(input: { clientMutationId: "second", name: "Lamp", tags: [] }) {
            thingId
            clientMutationId
        }
    }
"#;

const RENAME_TWICE: &str = r#"
    mutation {
        first: RenameThing(input: { clientMutationId: "first", newName: "Widget" }) {
            clientMutationId
        }
        second: RenameThing(input: { clientMutationId: "second", newName: "forbidden" }) {
            clientMutationId
        }
    }
"#;

#[tokio::test]
async fn several_mutations_in_one_operation_run_in_order() -> AnyResult<()> {
    let schema = schema()?;
    let context = ExecutionContext::new(schema.repository().clone());

    let response = schema
        .execute_with(RENAME_THEN_CREATE, context.clone())
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json()?,
        json!({
            "first": { "thingId": "t-1", "clientMutationId": "first" },
            "second": { "thingId": "t-2", "clientMutationId": "second" }
        })
    );

    let journal = schema.repository().journal();
    assert_eq!(journal.len(), 2);
    assert_eq!(journal[0].command(), "RenameThing");
    assert_eq!(journal[0].client_mutation_id(), Some("first"));
    assert_eq!(journal[1].command(), "CreateThing");
    assert_eq!(journal[1].client_mutation_id(), Some("second"));

    let current = context.command().expect("command recorded");
    assert_eq!(current.name(), "CreateThing");
    assert_eq!(current.client_mutation_id(), Some("second"));
    Ok(())
}

#[tokio::test]
async fn rejected_second_mutation_leaves_slot_empty() -> AnyResult<()> {
    let schema = schema()?;
    let context = ExecutionContext::new(schema.repository().clone());

    let response = schema.execute_with(RENAME_TWICE, context.clone()).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "domain: invalid state: name is locked"
    );

    let journal = schema.repository().journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].client_mutation_id(), Some("first"));
    assert!(context.command().is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_do_not_share_context() -> AnyResult<()> {
    let schema = Arc::new(schema()?);

    let mut set = JoinSet::new();
    for i in 0..50 {
        let schema = schema.clone();
        set.spawn(async move {
            let token = format!("req-{i}");
            let context = ExecutionContext::new(schema.repository().clone());
            let response = schema
                .execute_with(rename(&token, &format!("name-{i}")), context.clone())
                .await;
            (token, response, context)
        });
    }

    while let Some(joined) = set.join_next().await {
        let (token, response, context) = joined?;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json()?;
        assert_eq!(data["RenameThing"]["clientMutationId"], json!(token));
        let current = context.command().expect("command recorded");
        assert_eq!(current.client_mutation_id(), Some(token.as_str()));
    }

    assert_eq!(schema.repository().journal().len(), 50);
    Ok(())
}

#[test]
fn sdl_contains_generated_types() -> AnyResult<()> {
    let schema = schema()?;
    let sdl = schema.sdl();

    assert!(sdl.contains("input RenameThingInput"));
    assert!(sdl.contains("newName: String!"));
    assert!(sdl.contains("input CreateThingInput"));
    assert!(sdl.contains("location: LocationInput"));
    assert!(sdl.contains("input LocationInput"));
    assert!(sdl.contains("type RenameThing"));
    assert!(sdl.contains("clientMutationId: String"));
    assert!(sdl.contains("RenameThing(input: RenameThingInput!): RenameThing!"));
    Ok(())
}

#[test]
fn shapes_follow_registration_order() -> AnyResult<()> {
    let schema = schema()?;
    let names: Vec<&str> = schema.shapes().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["RenameThing", "CreateThing"]);
    assert_eq!(
        schema.shapes()[0].input().field_names(),
        vec!["newName", "clientMutationId"]
    );
    Ok(())
}

#[graphql_command(name = "RenameThing")]
struct RenameOther {
    label: String,
}

impl GraphQLCommand for RenameOther {
    type Result = ();
}

#[test]
fn colliding_mutation_names_fail_at_build() {
    let mut builder = MutationSchema::builder(Arc::new(InMemoryRepository::new()));
    builder.register::<RenameThing>().expect("first registration");
    let err = builder.register::<RenameOther>().err();
    assert!(matches!(err, Some(SchemaError::DuplicateMutation { .. })));
}
