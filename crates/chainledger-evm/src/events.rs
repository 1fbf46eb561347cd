//! Typed event sets.
//!
//! Each protocol declares the events it understands once, with the
//! `abi_events!` macro. The macro generates a closed enum, one variant per
//! signature, and an [`EventSet`] impl that lists the signatures for the
//! [`LogDecoder`](crate::decoder::LogDecoder) and binds a [`DecodedEvent`]
//! to the matching variant. Parsers then `match` on the enum, so a new
//! signature cannot be added without deciding how to handle it.
//!
//! ```ignore
//! abi_events! {
//!     pub enum WethEvent {
//!         event Deposit = "Deposit(address indexed dst, uint256 wad)" { dst: String, wad: U256 },
//!         note Lock = "lock(bytes32 cup, uint256 wad)" { guy: String, cup: B256, wad: U256 },
//!     }
//! }
//! ```
//!
//! Fields bind positionally. For `note` signatures the caller (`guy`) comes
//! first, followed by the declared arguments.

use alloy_primitives::{B256, I256, U256};
use chainledger_core::event::{DecodedEvent, DecodedValue};

use crate::decoder::SignatureKind;

/// A closed set of decodable events.
pub trait EventSet: Sized {
    /// Every signature in the set, with how it appears in logs.
    fn signatures() -> &'static [(SignatureKind, &'static str)];

    /// Bind a decoded event to its variant; `None` for the unmatched
    /// sentinel or a shape mismatch.
    fn from_decoded(event: &DecodedEvent) -> Option<Self>;
}

/// Conversion from one decoded argument to a field type.
pub trait FromArg: Sized {
    fn from_arg(value: &DecodedValue) -> Option<Self>;
}

impl FromArg for U256 {
    fn from_arg(value: &DecodedValue) -> Option<Self> {
        value.as_uint()
    }
}

impl FromArg for I256 {
    fn from_arg(value: &DecodedValue) -> Option<Self> {
        match value {
            DecodedValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromArg for bool {
    fn from_arg(value: &DecodedValue) -> Option<Self> {
        match value {
            DecodedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromArg for B256 {
    fn from_arg(value: &DecodedValue) -> Option<Self> {
        match value {
            DecodedValue::Word(w) => Some(*w),
            DecodedValue::Uint(v) => Some(B256::from(*v)),
            _ => None,
        }
    }
}

/// Chain-qualified account id.
impl FromArg for String {
    fn from_arg(value: &DecodedValue) -> Option<Self> {
        match value {
            DecodedValue::Address(a) | DecodedValue::Str(a) => Some(a.clone()),
            _ => None,
        }
    }
}

impl FromArg for DecodedValue {
    fn from_arg(value: &DecodedValue) -> Option<Self> {
        Some(value.clone())
    }
}

/// Declare a closed, typed event set. See the module docs.
#[macro_export]
macro_rules! abi_events {
    (@kind event) => { $crate::decoder::SignatureKind::Event };
    (@kind note) => { $crate::decoder::SignatureKind::Note };

    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $kind:ident $variant:ident = $sig:literal { $( $field:ident : $ty:ty ),* $(,)? }
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant { $( $field: $ty ),* },
            )*
        }

        impl $crate::events::EventSet for $name {
            fn signatures() -> &'static [($crate::decoder::SignatureKind, &'static str)] {
                &[ $( ($crate::abi_events!(@kind $kind), $sig) ),* ]
            }

            fn from_decoded(
                event: &$crate::__core::event::DecodedEvent,
            ) -> ::core::option::Option<Self> {
                let name = event.name.as_deref()?;
                $(
                    if name == $crate::decoder::signature_name($sig) {
                        #[allow(unused_mut, unused_variables)]
                        let mut args = event.args.iter().map(|(_, v)| v);
                        return ::core::option::Option::Some(Self::$variant {
                            $( $field: <$ty as $crate::events::FromArg>::from_arg(args.next()?)?, )*
                        });
                    }
                )*
                ::core::option::Option::None
            }
        }
    };
}

/// Bind a decoded event to a typed set; shorthand for `E::from_decoded`.
pub fn bind<E: EventSet>(event: &DecodedEvent) -> Option<E> {
    E::from_decoded(event)
}
