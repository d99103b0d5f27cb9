use ddd_graphql::command::CommandLayout;
use ddd_graphql_macros::graphql_command;

// 已声明 client_mutation_id 与 derive 时不重复生成
#[graphql_command]
#[derive(Clone, Default)]
pub struct CloseOrder {
    pub order_id: String,
    pub client_mutation_id: Option<String>,
}

fn main() {
    let cmd = CloseOrder {
        order_id: "o-1".into(),
        client_mutation_id: Some("c".into()),
    };
    let copy = cmd.clone();
    assert_eq!(copy.client_mutation_id(), Some("c"));
    assert_eq!(CloseOrder::properties().len(), 1);
}
