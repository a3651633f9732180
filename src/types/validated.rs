//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for string types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("driver name cannot be empty or whitespace")]
    EmptyDriverName,

    #[error("connection URI cannot be empty or whitespace")]
    EmptyConnectionUri,

    #[error("invalid connection URI: {0}")]
    InvalidConnectionUri(String),
}

/// Macro to generate validated string newtypes.
///
/// Each generated type gets:
/// - A `new()` constructor that validates
/// - `as_str()` getter
/// - `AsRef<str>`, `Deref`, `Display`, `TryFrom<String>` impls
/// - Serde `Serialize` and `Deserialize` with validation
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// A validated backend driver identifier that cannot be empty
    ///
    /// # Examples
    /// ```
    /// use dbpool::types::DriverName;
    ///
    /// let driver = DriverName::new("mysql".to_string()).unwrap();
    /// assert_eq!(driver.as_str(), "mysql");
    ///
    /// assert!(DriverName::new("".to_string()).is_err());
    /// assert!(DriverName::new("   ".to_string()).is_err());
    /// ```
    pub struct DriverName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyDriverName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// A validated connection URI that cannot be empty or whitespace-only
    ///
    /// # Examples
    /// ```
    /// use dbpool::types::ConnectionUri;
    ///
    /// let uri = ConnectionUri::new("mysql://db.example.com:3306/shop".to_string()).unwrap();
    /// assert_eq!(uri.as_str(), "mysql://db.example.com:3306/shop");
    ///
    /// assert!(ConnectionUri::new("".to_string()).is_err());
    /// ```
    pub struct ConnectionUri(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyConnectionUri)
            } else {
                Ok(())
            }
        },
    }
}

impl ConnectionUri {
    /// Extract the `host:port` authority from the URI
    ///
    /// Accepts both full URIs (`scheme://host:port/db`) and bare
    /// `host:port` addresses.
    pub fn authority(&self) -> Result<&str, ValidationError> {
        let rest = match self.0.split_once("://") {
            Some((_, rest)) => rest,
            None => self.0.as_str(),
        };
        let authority = rest.split('/').next().unwrap_or(rest);
        if authority.is_empty() {
            return Err(ValidationError::InvalidConnectionUri(self.0.clone()));
        }
        Ok(authority)
    }
}
