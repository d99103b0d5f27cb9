use ddd_graphql::layout::{GraphQLType, ObjectLayout};
use ddd_graphql_macros::graphql_object;

#[graphql_object]
struct Empty {}

/// 订单
#[graphql_object(name = "Order")]
#[derive(Debug)]
struct OrderView {
    order_id: String,
    lines: Vec<Line>,
    #[graphql(skip)]
    cache: Option<String>,
}

#[graphql_object]
struct Line {
    sku: String,
    quantity: i32,
}

fn main() {
    let view = OrderView::default();
    let _copy = view.clone();
    assert_eq!(view, OrderView::default());

    let descriptor = OrderView::object_descriptor();
    assert_eq!(descriptor.name(), "Order");
    assert_eq!(descriptor.description(), Some("订单"));
    assert_eq!(descriptor.field_names(), vec!["orderId", "lines"]);

    assert!(Empty::object_descriptor().fields().is_empty());
    assert_eq!(Empty::from_json(serde_json::json!({})).unwrap(), Empty {});

    let json = view.to_json().unwrap();
    assert_eq!(json, serde_json::json!({ "orderId": "", "lines": [] }));
    assert!(OrderView::from_json(serde_json::json!(1)).is_err());
}
