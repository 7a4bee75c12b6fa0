use crate::util::*;
use coerce_dapr::actor::{
    ActorClient, ActorProxy, ActorProxyBuilder, ActorProxyErr, ActorReference,
};
use coerce_dapr::config::ActorConfig;
use coerce_dapr::transport::TransportErr;
use serde_json::json;

pub mod util;

#[macro_use]
extern crate async_trait;

#[macro_use]
extern crate serde;

#[derive(Deserialize, Debug, PartialEq)]
struct Balance {
    account: String,
    amount: i64,
}

fn invoke_call(actor_type: &str, actor_id: &str, method: &str, body: Option<Vec<serde_json::Value>>) -> TransportCall {
    TransportCall::Invoke {
        actor_type: actor_type.to_string(),
        actor_id: actor_id.to_string(),
        method: method.to_string(),
        body,
    }
}

#[tokio::test]
pub async fn test_arguments_sent_in_order() {
    create_trace_logger();

    let transport = MockTransport::new();
    let builder = ActorProxyBuilder::<()>::named("CalculatorActor", transport.clone());
    let proxy = builder.build("calc-1", None);

    proxy.invoke("add", vec![json!(1), json!(2)]).await.unwrap();
    proxy.invoke("reset", vec![]).await.unwrap();

    assert_eq!(
        transport.calls(),
        vec![
            invoke_call("CalculatorActor", "calc-1", "add", Some(vec![json!(1), json!(2)])),
            invoke_call("CalculatorActor", "calc-1", "reset", None),
        ]
    );
}

#[tokio::test]
pub async fn test_proxies_address_their_own_actor() {
    create_trace_logger();

    let transport = MockTransport::new();
    let builder = ActorProxyBuilder::<()>::named("CounterActor", transport.clone());

    let first = builder.build("a", None);
    let second = builder.build("b", None);

    second.invoke("increment", vec![]).await.unwrap();
    first.invoke("increment", vec![]).await.unwrap();

    assert_eq!(
        transport.calls(),
        vec![
            invoke_call("CounterActor", "b", "increment", None),
            invoke_call("CounterActor", "a", "increment", None),
        ]
    );

    assert_eq!(first.reference().to_string(), "CounterActor/a");
}

#[tokio::test]
pub async fn test_type_name_override() {
    create_trace_logger();

    let transport = MockTransport::new();
    let builder = ActorProxyBuilder::<()>::named("CounterActor", transport.clone())
        .with_type_name_prefix("tenant1-");

    assert_eq!(builder.default_type_name(), "tenant1-CounterActor");

    let proxy = builder.build(42, Some("LegacyCounter"));
    assert_eq!(proxy.actor_type(), "LegacyCounter");
    assert_eq!(proxy.actor_id(), "42");

    proxy.invoke("get", vec![]).await.unwrap();
    assert_eq!(
        transport.calls(),
        vec![invoke_call("LegacyCounter", "42", "get", None)]
    );
}

#[tokio::test]
pub async fn test_response_decoded() {
    create_trace_logger();

    let transport = MockTransport::new();
    transport.respond_with("getBalance", json!({"account": "acc-1", "amount": 250}));

    let proxy = ActorProxy::dynamic(
        ActorReference::new("AccountActor", "acc-1"),
        transport.clone(),
    );

    let balance: Balance = proxy.invoke_as("getBalance", vec![]).await.unwrap();
    assert_eq!(
        balance,
        Balance {
            account: "acc-1".to_string(),
            amount: 250
        }
    );

    let result: Result<Balance, _> = proxy.invoke_as("unknown", vec![]).await;
    assert!(matches!(result, Err(ActorProxyErr::Deserialisation(_))));
}

#[tokio::test]
pub async fn test_transport_failure_surfaced() {
    create_trace_logger();

    let transport = MockTransport::new();
    transport.fail_invocations(TransportErr::Status {
        code: 500,
        body: "actor error".to_string(),
    });

    let client = ActorClient::new(transport.clone());
    let proxy = client.get_dynamic("CounterActor", "c1");

    let result = proxy.invoke("increment", vec![]).await;
    assert_eq!(
        result,
        Err(ActorProxyErr::Transport(TransportErr::Status {
            code: 500,
            body: "actor error".to_string()
        }))
    );

    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
pub async fn test_building_proxy_is_lazy() {
    create_trace_logger();

    let transport = MockTransport::new();
    let client = ActorClient::with_config(
        transport.clone(),
        ActorConfig {
            type_name_prefix: Some("prod-".to_string()),
        },
    );

    let proxy = client.get_dynamic("CounterActor", "c1");
    let _clone = proxy.clone();

    assert!(transport.calls().is_empty());
    assert_eq!(proxy.actor_type(), "CounterActor");
}
