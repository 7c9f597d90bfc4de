use serde::{Deserialize, Serialize};

macro_rules! tag_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

tag_newtype!(RequestKey, u64);
tag_newtype!(Classification, i32);

/// Well-known resource classes. The tag is opaque to the networker apart from
/// priority weighting, so callers may use any other value as well.
impl Classification {
    pub const DEFAULT: Self = Self(0);
    pub const MESSAGES: Self = Self(1);
    pub const GUILD: Self = Self(2);
    pub const IMAGE: Self = Self(3);
    pub const IMAGE_ATTACHMENT: Self = Self(4);
    pub const PROFILE: Self = Self(5);
    pub const PINS: Self = Self(6);
    pub const ATTACHMENT_UPLOAD: Self = Self(7);

    /// Bulk content the user is actively looking at.
    pub fn is_bulk_content(self) -> bool {
        matches!(
            self,
            Self::MESSAGES | Self::GUILD | Self::IMAGE_ATTACHMENT
        )
    }

    /// Small decorative images such as avatars and icons.
    pub fn is_plain_image(self) -> bool {
        self == Self::IMAGE
    }
}
