//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// The block is moved into the future, so clone any `Arc`s it needs first.
///
/// # Example
///
/// ```rust,ignore
/// use ticketer_core::async_effect;
///
/// let encoder = Arc::clone(&env.encoder);
/// async_effect! {
///     let result = encoder.encode(payload).await;
///     Some(FormAction::from_encode_result(request, result))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Encoded { value: String },
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Encoded { value: "done".to_string() })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_async_effect_resolves_to_action() {
        let value = String::from("moved");
        let effect = async_effect! {
            Some(TestAction::Encoded { value })
        };

        let Effect::Future(fut) = effect else {
            unreachable!("async_effect! always builds Effect::Future");
        };
        let action = tokio_test::block_on(fut);
        assert_eq!(
            action,
            Some(TestAction::Encoded {
                value: "moved".to_string()
            })
        );
    }
}
