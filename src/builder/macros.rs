//! Macros for declaring label types.

/// Declare a fieldless enum usable as a machine label.
///
/// Derives `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Debug` and serde
/// (through this crate, so callers need no `serde` dependency of their
/// own), implements [`Label`](crate::core::Label) with the variant name as
/// the label name, and implements `Display` the same way.
///
/// # Example
///
/// ```
/// use flipflop::label_enum;
/// use flipflop::core::Label;
///
/// label_enum! {
///     pub enum Phase {
///         Waiting,
///         Running,
///         Done,
///     }
///     final: [Done]
/// }
///
/// assert_eq!(Phase::Running.name(), "Running");
/// assert_eq!(Phase::Done.to_string(), "Done");
/// assert!(Phase::Done.is_final());
/// ```
#[macro_export]
macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            $crate::__serde::Serialize,
            $crate::__serde::Deserialize
        )]
        #[serde(crate = "flipflop::__serde")]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::Label for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            #[allow(unreachable_patterns)]
            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::Label::name(self))
            }
        }
    };
}
