/// A closed enumeration: values without a variant convert to `None`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty, $to:ident, $from:ident {
            $($variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const fn $to(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            pub const fn $from(value: $repr) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

/// An open enumeration: values without a variant survive as `Other`.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty, $to:ident, $from:ident {
            $($variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other($repr),
        }

        impl $name {
            pub const fn $to(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Other(value) => value,
                }
            }

            pub const fn $from(value: $repr) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    other => Self::Other(other),
                }
            }
        }
    };
}
