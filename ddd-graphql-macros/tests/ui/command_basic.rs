use ddd_graphql::command::{Command, CommandLayout, GraphQLCommand};
use ddd_graphql_macros::{graphql_command, graphql_object};

#[graphql_object]
struct Renamed {
    thing_id: String,
}

/// 重命名
#[graphql_command]
struct RenameThing {
    new_name: String,
    #[graphql(name = "reason")]
    why: Option<String>,
    #[graphql(skip)]
    retries: u32,
}

impl GraphQLCommand for RenameThing {
    type Result = Renamed;
}

#[graphql_command(name = "Ping")]
struct PingCommand {}

impl GraphQLCommand for PingCommand {
    type Result = ();
}

fn main() {
    // Default / Debug 由宏派生
    let mut cmd = RenameThing::default();
    let _ = format!("{:?}", cmd);

    cmd.set_client_mutation_id(Some("m-1".to_string()));
    assert_eq!(cmd.client_mutation_id(), Some("m-1"));
    assert_eq!(cmd.retries, 0);

    assert_eq!(RenameThing::NAME, "RenameThing");
    assert_eq!(RenameThing::DESCRIPTION, Some("重命名"));
    let names: Vec<&str> = RenameThing::properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["newName", "reason"]);

    assert_eq!(PingCommand::NAME, "Ping");
    assert!(PingCommand::properties().is_empty());
}
