//! String columns that may arrive as text or as bytes

use std::fmt;
use std::ops::Deref;

use sqlx::any::{Any, AnyTypeInfo, AnyTypeInfoKind, AnyValueRef};
use sqlx::error::BoxDynError;
use sqlx::{Decode, Type, ValueRef};

/// UTF-8 column value.
///
/// MySQL reports `TEXT` columns as blobs through the Any driver, so both
/// kinds decode here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbText(pub String);

impl DbText {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for DbText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DbText> for String {
    fn from(text: DbText) -> Self {
        text.0
    }
}

impl From<&str> for DbText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl Type<Any> for DbText {
    fn type_info() -> AnyTypeInfo {
        <String as Type<Any>>::type_info()
    }

    fn compatible(ty: &AnyTypeInfo) -> bool {
        matches!(ty.kind(), AnyTypeInfoKind::Text | AnyTypeInfoKind::Blob)
    }
}

impl<'r> Decode<'r, Any> for DbText {
    fn decode(value: AnyValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.type_info().kind() == AnyTypeInfoKind::Blob {
            let bytes = <Vec<u8> as Decode<'r, Any>>::decode(value)?;
            return Ok(Self(String::from_utf8(bytes)?));
        }
        <String as Decode<'r, Any>>::decode(value).map(Self)
    }
}
