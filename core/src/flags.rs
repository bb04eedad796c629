//! Compact bit-set newtypes used for ride capabilities and lifecycle markers.

/// Declares a `Copy` bit-set newtype with named flag constants.
macro_rules! flag_set {
    (
        $(#[$outer:meta])*
        pub struct $name:ident($repr:ty) {
            $(
                $(#[$inner:meta])*
                const $flag:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$outer])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        pub struct $name($repr);

        impl $name {
            $(
                $(#[$inner])*
                pub const $flag: Self = Self($value);
            )*

            /// Set with no flag raised.
            #[must_use]
            pub const fn empty() -> Self {
                Self(0)
            }

            /// Raw bit representation of the set.
            #[must_use]
            pub const fn bits(self) -> $repr {
                self.0
            }

            /// Reports whether every flag of `other` is raised.
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Reports whether at least one flag of `other` is raised.
            #[must_use]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// Union of both sets.
            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// Raises every flag of `other`.
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Lowers every flag of `other`.
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }

            /// Raises or lowers every flag of `other`.
            pub fn set(&mut self, other: Self, enabled: bool) {
                if enabled {
                    self.insert(other);
                } else {
                    self.remove(other);
                }
            }
        }

        impl ::std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }
    };
}
