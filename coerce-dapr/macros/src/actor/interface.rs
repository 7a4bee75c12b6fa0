use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, AttributeArgs, FnArg, ItemTrait, Lit, Meta, NestedMeta, Pat, ReturnType,
    TraitItem, TraitItemMethod, Type,
};

const NAME_ATTR: &str = "name";
const METHOD_ATTR: &str = "method";

pub(crate) fn expand(args: AttributeArgs, mut item: ItemTrait) -> TokenStream {
    let type_name = match interface_name(&args) {
        Ok(name) => name.unwrap_or_else(|| item.ident.to_string()),
        Err(err) => return err.to_compile_error(),
    };

    if !item.generics.params.is_empty() {
        return syn::Error::new_spanned(&item.generics, "actor interfaces cannot be generic")
            .to_compile_error();
    }

    let mut methods = vec![];
    for trait_item in item.items.iter_mut() {
        if let TraitItem::Method(method) = trait_item {
            let remote_name = match take_method_name(&mut method.attrs) {
                Ok(name) => name.unwrap_or_else(|| method.sig.ident.to_string()),
                Err(err) => return err.to_compile_error(),
            };

            // methods with a body run locally, on top of the forwarded ones
            if method.default.is_some() {
                continue;
            }

            match forward_method(method, &remote_name) {
                Ok(tokens) => methods.push(tokens),
                Err(err) => return err.to_compile_error(),
            }
        }
    }

    let ident = &item.ident;

    quote! {
        #item

        impl ::coerce_dapr::actor::ActorInterface for dyn #ident {
            fn type_name() -> &'static str {
                #type_name
            }
        }

        #[::coerce_dapr::async_trait]
        impl #ident for ::coerce_dapr::actor::ActorProxy<dyn #ident> {
            #(#methods)*
        }
    }
}

fn interface_name(args: &AttributeArgs) -> syn::Result<Option<String>> {
    let mut name = None;
    for arg in args {
        match arg {
            NestedMeta::Meta(Meta::NameValue(val)) if val.path.is_ident(NAME_ATTR) => {
                match &val.lit {
                    Lit::Str(s) => name = Some(s.value()),
                    lit => {
                        return Err(syn::Error::new_spanned(
                            lit,
                            r#"Expect `name = "TYPE_NAME"`"#,
                        ))
                    }
                }
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    r#"Expect `name = "TYPE_NAME"`"#,
                ))
            }
        }
    }

    Ok(name)
}

fn take_method_name(attrs: &mut Vec<Attribute>) -> syn::Result<Option<String>> {
    let position = match attrs.iter().position(|a| a.path.is_ident(METHOD_ATTR)) {
        Some(position) => position,
        None => return Ok(None),
    };

    let attr = attrs.remove(position);
    let syntax_err = |span: &dyn quote::ToTokens| {
        syn::Error::new_spanned(
            span,
            format!(
                r#"The correct syntax is #[{}("remoteName")] or #[{}(name = "remoteName")]"#,
                METHOD_ATTR, METHOD_ATTR
            ),
        )
    };

    match attr.parse_meta()? {
        Meta::List(list) => match list.nested.first() {
            Some(NestedMeta::Lit(Lit::Str(s))) => Ok(Some(s.value())),
            Some(NestedMeta::Meta(Meta::NameValue(val))) if val.path.is_ident(NAME_ATTR) => {
                match &val.lit {
                    Lit::Str(s) => Ok(Some(s.value())),
                    lit => Err(syntax_err(lit)),
                }
            }
            _ => Err(syntax_err(&list)),
        },
        meta => Err(syntax_err(&meta)),
    }
}

fn forward_method(method: &TraitItemMethod, remote_name: &str) -> syn::Result<TokenStream> {
    let sig = &method.sig;
    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig,
            "actor interface methods must be async, is #[actor_interface] placed above #[async_trait]?",
        ));
    }

    match sig.receiver() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "actor interface methods must take `&self`",
            ))
        }
    }

    if !returns_result(&sig.output) {
        return Err(syn::Error::new_spanned(
            &sig.output,
            "actor interface methods must return `Result<T, E>` where `E: From<ActorProxyErr>`",
        ));
    }

    let mut arguments = vec![];
    for input in sig.inputs.iter().skip(1) {
        match input {
            FnArg::Typed(pat_type) => match pat_type.pat.as_ref() {
                Pat::Ident(pat_ident) => arguments.push(pat_ident.ident.clone()),
                pat => {
                    return Err(syn::Error::new_spanned(
                        pat,
                        "actor interface arguments must be plain identifiers",
                    ))
                }
            },
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(receiver, "unexpected receiver"))
            }
        }
    }

    Ok(quote! {
        #sig {
            let args: ::std::vec::Vec<::coerce_dapr::serde_json::Value> = ::std::vec![
                #(::coerce_dapr::actor::to_argument(&#arguments)?),*
            ];

            self.invoke_as(#remote_name, args)
                .await
                .map_err(::std::convert::Into::into)
        }
    })
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Path(path) => path
                .path
                .segments
                .last()
                .map_or(false, |segment| segment.ident == "Result"),
            _ => false,
        },
        ReturnType::Default => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand_trait(item: ItemTrait) -> String {
        expand(vec![], item).to_string()
    }

    #[test]
    fn test_result_methods_are_forwarded() {
        let output = expand_trait(parse_quote! {
            pub trait Counter {
                #[method("getCounter")]
                async fn get_counter(&self) -> Result<i64, ActorProxyErr>;
            }
        });

        assert!(!output.contains("compile_error"));
        assert!(output.contains("\"getCounter\""));
    }

    #[test]
    fn test_non_result_return_rejected() {
        let output = expand_trait(parse_quote! {
            pub trait Counter {
                async fn get_counter(&self) -> i64;
            }
        });

        assert!(output.contains("compile_error"));
        assert!(output.contains("must return `Result<T, E>`"));
    }

    #[test]
    fn test_missing_return_rejected() {
        let output = expand_trait(parse_quote! {
            pub trait Counter {
                async fn increment(&self);
            }
        });

        assert!(output.contains("compile_error"));
    }

    #[test]
    fn test_sync_method_rejected() {
        let output = expand_trait(parse_quote! {
            pub trait Counter {
                fn get_counter(&self) -> Result<i64, ActorProxyErr>;
            }
        });

        assert!(output.contains("must be async"));
    }
}
