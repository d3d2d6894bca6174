/// Declares an enum mirroring a subset of a Vulkan enum.
#[macro_export]
macro_rules! vk_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $ident:ident: $vk_type:ty {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $vk_value:ident,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $ident {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $ident {
            /// Converts from a Vulkan enum value.
            pub const fn from_vk(value: $vk_type) -> Option<Self> {
                match value {
                    $(
                        <$vk_type>::$vk_value => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            /// Converts to a Vulkan enum value.
            pub const fn to_vk(self) -> $vk_type {
                match self {
                    $(
                        Self::$variant => <$vk_type>::$vk_value,
                    )*
                }
            }
        }
    };
}

/// Declares a transparent flags type over a Vulkan flags type.
///
/// Besides the named flags, the generated type offers `const` set operations
/// so that masks can be composed in `const` items.
#[macro_export]
macro_rules! vk_enum_flags {
    (
        $(#[$meta:meta])*
        $vis:vis struct $ident:ident: $vk_type:ty {
            $(
                $(#[$field_meta:meta])*
                $field:ident => $vk_flag:ident,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        $vis struct $ident($vk_type);

        impl $ident {
            $(
                $(#[$field_meta])*
                pub const $field: Self = Self(<$vk_type>::$vk_flag);
            )*

            /// Creates an empty flags set.
            #[inline]
            pub const fn empty() -> Self {
                Self(<$vk_type>::empty())
            }

            /// Checks if no flag is set.
            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Checks if all flags of `other` are set.
            #[inline]
            pub const fn contains(&self, other: Self) -> bool {
                self.0.contains(other.0)
            }

            /// Checks if any flag of `other` is set.
            #[inline]
            pub const fn intersects(&self, other: Self) -> bool {
                self.0.intersects(other.0)
            }

            #[inline]
            pub const fn union(self, other: Self) -> Self {
                Self(<$vk_type>::from_raw(self.0.as_raw() | other.0.as_raw()))
            }

            #[inline]
            pub const fn intersection(self, other: Self) -> Self {
                Self(<$vk_type>::from_raw(self.0.as_raw() & other.0.as_raw()))
            }

            #[inline]
            pub const fn difference(self, other: Self) -> Self {
                Self(<$vk_type>::from_raw(self.0.as_raw() & !other.0.as_raw()))
            }

            /// Converts from Vulkan flags.
            #[inline]
            pub const fn from_vk(flags: $vk_type) -> Self {
                Self(flags)
            }

            /// Converts to Vulkan flags.
            #[inline]
            pub const fn to_vk(self) -> $vk_type {
                self.0
            }
        }

        impl Default for $ident {
            fn default() -> Self {
                Self::empty()
            }
        }

        impl std::ops::BitOr for $ident {
            type Output = Self;

            #[inline]
            fn bitor(self, rhs: Self) -> Self::Output {
                self.union(rhs)
            }
        }

        impl std::ops::BitOrAssign for $ident {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                *self = self.union(rhs);
            }
        }

        impl std::ops::BitAnd for $ident {
            type Output = Self;

            #[inline]
            fn bitand(self, rhs: Self) -> Self::Output {
                self.intersection(rhs)
            }
        }

        impl std::ops::BitAndAssign for $ident {
            #[inline]
            fn bitand_assign(&mut self, rhs: Self) {
                *self = self.intersection(rhs);
            }
        }

        impl std::ops::Not for $ident {
            type Output = Self;

            #[inline]
            fn not(self) -> Self::Output {
                Self(<$vk_type>::from_raw(!self.0.as_raw()))
            }
        }
    };
}
