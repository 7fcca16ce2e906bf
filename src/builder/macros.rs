//! Macros for ergonomic state naming.

/// Declare a fieldless enum usable as a state name.
///
/// Each variant's key is its own identifier, so `Arm::Raise` and `"Raise"`
/// refer to the same state.
///
/// # Example
///
/// ```
/// use tickstate::core::StateKey;
/// use tickstate::state_key;
///
/// state_key! {
///     pub enum Arm {
///         Raise,
///         Hold,
///         Lower,
///     }
/// }
///
/// assert_eq!(Arm::Hold.key(), "Hold");
/// ```
#[macro_export]
macro_rules! state_key {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::StateKey for $name {
            fn key(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
