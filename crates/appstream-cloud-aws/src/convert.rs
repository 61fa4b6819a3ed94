//! Conversions between SDK types and the `appstream-cloud` shapes

use chrono::{DateTime, Utc};

/// Required SDK members come back as `&str`/`&Enum`, optional ones as
/// `Option<&..>`. Both collapse to an owned `Option<String>`.
pub(crate) trait SdkStr {
    fn owned(self) -> Option<String>;
}

impl<T: AsRef<str> + ?Sized> SdkStr for &T {
    fn owned(self) -> Option<String> {
        Some(self.as_ref().to_string())
    }
}

impl<T: AsRef<str> + ?Sized> SdkStr for Option<&T> {
    fn owned(self) -> Option<String> {
        self.map(|v| v.as_ref().to_string())
    }
}

/// List members come back as slices, or as optional slices in older SDKs
pub(crate) trait SdkList<'a, T> {
    fn items(self) -> &'a [T];
}

impl<'a, T> SdkList<'a, T> for &'a [T] {
    fn items(self) -> &'a [T] {
        self
    }
}

impl<'a, T> SdkList<'a, T> for Option<&'a [T]> {
    fn items(self) -> &'a [T] {
        self.unwrap_or_default()
    }
}

/// Empty lists are reported as absent
pub(crate) fn non_empty<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items.to_vec())
    }
}

pub(crate) fn timestamp(value: &aws_sdk_appstream::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}
