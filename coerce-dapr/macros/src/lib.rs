extern crate proc_macro;

mod actor;

use syn::{AttributeArgs, ItemTrait};

/// Generates a remote stub for an actor interface trait.
///
/// Must be placed above `#[async_trait]`:
/// ```rust,ignore
/// #[actor_interface(name = "CounterActor")]
/// #[async_trait]
/// pub trait Counter {
///     #[method("getCounter")]
///     async fn get_counter(&self) -> Result<i64, ActorProxyErr>;
/// }
/// ```
///
/// Every required method is implemented for `ActorProxy<dyn Counter>` by forwarding the
/// call to the remote actor, and `ActorInterface` is implemented for `dyn Counter`.
#[proc_macro_attribute]
pub fn actor_interface(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let args = syn::parse_macro_input!(attr as AttributeArgs);
    let item = syn::parse_macro_input!(item as ItemTrait);

    actor::interface::expand(args, item).into()
}
