// Byte-type generators shared by the type modules.

/// Public fixed-size byte value with hex serde and hex `Debug`.
macro_rules! define_bytes_type {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $size]);

        impl $name {
            /// Encoded size in bytes.
            pub const SIZE: usize = $size;

            /// Creates a value from a fixed-size array.
            pub const fn from_array(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            /// Creates a value from raw bytes.
            ///
            /// # Errors
            /// Returns error if the length doesn't match `SIZE`.
            pub fn from_bytes(bytes: &[u8]) -> $crate::error::Result<Self> {
                let arr: [u8; $size] =
                    bytes
                        .try_into()
                        .map_err(|_| $crate::error::CarrotError::InvalidKeySize {
                            expected: $size,
                            actual: bytes.len(),
                        })?;
                Ok(Self(arr))
            }

            /// Returns the underlying array.
            pub const fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            /// Consumes the value and returns the array.
            pub const fn to_array(self) -> [u8; $size] {
                self.0
            }

            /// Returns the hex encoding.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parses a hex string.
            pub fn from_hex(s: &str) -> $crate::error::Result<Self> {
                let bytes = hex::decode(s)?;
                Self::from_bytes(&bytes)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $size])
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Secret fixed-size byte value: zeroized on drop, redacted `Debug`,
/// constant-time equality, no serde.
macro_rules! define_secret_type {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, zeroize::Zeroize, zeroize::ZeroizeOnDrop)]
        pub struct $name([u8; $size]);

        impl $name {
            /// Creates a secret from a fixed-size array.
            pub const fn from_array(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            /// Creates a secret from raw bytes.
            ///
            /// # Errors
            /// Returns error if the length doesn't match.
            pub fn from_bytes(bytes: &[u8]) -> $crate::error::Result<Self> {
                let arr: [u8; $size] =
                    bytes
                        .try_into()
                        .map_err(|_| $crate::error::CarrotError::InvalidKeySize {
                            expected: $size,
                            actual: bytes.len(),
                        })?;
                Ok(Self(arr))
            }

            /// Parses a hex string.
            pub fn from_hex(s: &str) -> $crate::error::Result<Self> {
                let mut bytes = hex::decode(s)?;
                let secret = Self::from_bytes(&bytes);
                zeroize::Zeroize::zeroize(&mut bytes);
                secret
            }

            /// Returns the raw secret bytes.
            ///
            /// # Security
            /// Handle the returned bytes carefully - do not log or expose them.
            pub const fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            /// Returns the hex encoding of the secret, for export only.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                subtle::ConstantTimeEq::ct_eq(&self.0[..], &other.0[..]).into()
            }
        }

        impl Eq for $name {}

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}([REDACTED])", stringify!($name))
            }
        }
    };
}
