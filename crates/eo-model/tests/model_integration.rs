use eo_model::{Attribute, DeleteRule, Entity, Join, Model, ModelTag, Relationship, ValueType};

fn build_order_model() -> Model {
    let customer = Entity::builder("Customer")
        .external_name("customers")
        .attribute(Attribute::new("id", ValueType::Int).required())
        .primary_key(vec!["id"])
        .relationship(
            Relationship::new("orders", true)
                .with_destination_entity_name("Order")
                .with_joins(vec![Join::new("id", "customer_id")]),
        )
        .build()
        .unwrap();

    let order = Entity::builder("Order")
        .external_name("orders")
        .attribute(Attribute::new("id", ValueType::Int).required())
        .attribute(Attribute::new("customer_id", ValueType::Int).required())
        .primary_key(vec!["id"])
        .relationship(
            Relationship::new("customer", false)
                .with_destination_entity_name("Customer")
                .with_joins(vec![Join::new("customer_id", "id")])
                .with_delete_rule(DeleteRule::Deny),
        )
        .build()
        .unwrap();

    Model::new(vec![customer, order], ModelTag::new(1)).unwrap()
}

#[test]
fn relationships_resolve_to_each_other_after_connect() {
    let model = build_order_model();

    let customer = model.entity("Customer").unwrap();
    let orders_rel = customer.relationship("orders").unwrap();
    assert_eq!(orders_rel.destination_entity().unwrap().name(), "Order");

    let order = model.entity("Order").unwrap();
    let customer_rel = order.relationship("customer").unwrap();
    assert_eq!(customer_rel.destination_entity().unwrap().name(), "Customer");
    assert_eq!(customer_rel.delete_rule(), DeleteRule::Deny);
}

#[test]
fn joins_on_reciprocal_relationships_are_reciprocal() {
    let model = build_order_model();
    let customer = model.entity("Customer").unwrap();
    let order = model.entity("Order").unwrap();

    let to_orders = &customer.relationship("orders").unwrap().joins()[0];
    let to_customer = &order.relationship("customer").unwrap().joins()[0];
    assert!(to_orders.is_reciprocal_to(to_customer));
}

#[test]
fn disconnect_then_reconnect_restores_resolution() {
    let model = build_order_model();
    model.disconnect_relationships();
    assert!(model
        .entity("Customer")
        .unwrap()
        .relationship("orders")
        .unwrap()
        .destination_entity()
        .is_none());

    model.connect_relationships();
    assert!(model
        .entity("Customer")
        .unwrap()
        .relationship("orders")
        .unwrap()
        .destination_entity()
        .is_some());
}

#[test]
fn global_id_for_row_round_trips_through_model() {
    let model = build_order_model();
    let order = model.entity("Order").unwrap();

    let mut row = eo_model::Snapshot::new();
    row.set("id", Some(eo_value::Value::Int(42)));
    row.set("customer_id", Some(eo_value::Value::Int(7)));

    let gid = order.global_id_for_row(&row).unwrap();
    assert_eq!(gid.entity_name(), "Order");
    assert_eq!(gid.keys(), vec![("id".to_string(), eo_value::Value::Int(42))]);
}
