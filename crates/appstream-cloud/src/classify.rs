//! Error classification
//!
//! Pure predicates that map cloud errors to the categories the reconcilers
//! care about. Every predicate walks the `source()` chain, so an error
//! wrapped with [`CloudError::context`] classifies like the error it wraps.
//! Errors that match no category are left alone and propagate without retry.

use crate::error::{
    CONCURRENT_MODIFICATION, CloudError, OPERATION_NOT_PERMITTED, RESOURCE_ALREADY_EXISTS,
    RESOURCE_NOT_AVAILABLE, RESOURCE_NOT_FOUND,
};
use std::error::Error as StdError;

/// Iterate over every `CloudError` in the chain, outermost first
fn chain<'a>(err: &'a CloudError) -> impl Iterator<Item = &'a CloudError> + 'a {
    let mut next: Option<&'a (dyn StdError + 'static)> = Some(err);
    std::iter::from_fn(move || {
        while let Some(current) = next {
            next = current.source();
            if let Some(cloud) = current.downcast_ref::<CloudError>() {
                return Some(cloud);
            }
        }
        None
    })
}

fn has_code(err: &CloudError, code: &str) -> bool {
    chain(err).any(|e| e.code() == Some(code))
}

/// Context canceled or deadline exceeded
pub fn is_canceled(err: &CloudError) -> bool {
    chain(err).any(|e| matches!(e, CloudError::Canceled | CloudError::DeadlineExceeded))
}

pub fn is_not_found(err: &CloudError) -> bool {
    has_code(err, RESOURCE_NOT_FOUND)
}

pub fn is_already_exists(err: &CloudError) -> bool {
    has_code(err, RESOURCE_ALREADY_EXISTS)
}

pub fn is_concurrent_modification(err: &CloudError) -> bool {
    has_code(err, CONCURRENT_MODIFICATION)
}

pub fn is_operation_not_permitted(err: &CloudError) -> bool {
    has_code(err, OPERATION_NOT_PERMITTED)
}

pub fn is_resource_not_available(err: &CloudError) -> bool {
    has_code(err, RESOURCE_NOT_AVAILABLE)
}

/// The resource is still transitioning and the caller should poll again
pub fn is_unexpected_state(err: &CloudError) -> bool {
    chain(err).any(|e| matches!(e, CloudError::UnexpectedState { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_codes() {
        let err = CloudError::api("DescribeImageBuilders", RESOURCE_NOT_FOUND, "gone");
        assert!(is_not_found(&err));
        assert!(!is_already_exists(&err));
        assert!(!is_canceled(&err));

        let err = CloudError::api("CreateImageBuilder", CONCURRENT_MODIFICATION, "busy");
        assert!(is_concurrent_modification(&err));
        assert!(!is_operation_not_permitted(&err));
    }

    #[test]
    fn test_unwraps_chains() {
        let err = CloudError::api("StopImageBuilder", OPERATION_NOT_PERMITTED, "pending")
            .context("stopping image builder ib")
            .context("deleting image builder ib");
        assert!(is_operation_not_permitted(&err));

        let err = CloudError::Canceled.context("reading tags");
        assert!(is_canceled(&err));

        let err = CloudError::unexpected_state("STOPPED", "STOPPING").context("waiting");
        assert!(is_unexpected_state(&err));
    }

    #[test]
    fn test_unknown_errors_classify_as_none() {
        let err = CloudError::api("CreateImageBuilder", "InvalidParameterCombinationException", "bad");
        assert!(!is_not_found(&err));
        assert!(!is_already_exists(&err));
        assert!(!is_concurrent_modification(&err));
        assert!(!is_operation_not_permitted(&err));
        assert!(!is_resource_not_available(&err));
        assert!(!is_canceled(&err));
        assert!(!is_unexpected_state(&err));

        let err = CloudError::InvalidConfig("bad".to_string());
        assert!(!is_not_found(&err));
    }
}
