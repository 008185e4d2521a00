//! Unit tests for ResourceError and ResourceResult types

use ferrous_resources::{ResourceError, ResourceResult};
use std::error::Error;

#[test]
fn test_error_display_not_implemented() {
    let error = ResourceError::NotImplemented("TempDir".to_string());
    let display_str = format!("{}", error);
    assert_eq!(display_str, "Resource 'TempDir' does not implement make");
}

#[test]
fn test_error_display_over_released() {
    let error = ResourceError::OverReleased("db".to_string());
    assert_eq!(error.to_string(), "Resource 'db' released more times than it was acquired");
}

#[test]
fn test_error_display_circular() {
    let path = vec!["A".to_string(), "B".to_string(), "A".to_string()];
    let error = ResourceError::Circular(path);
    assert_eq!(error.to_string(), "Circular resource dependency: A -> B -> A");
}

#[test]
fn test_error_display_labels() {
    let duplicate = ResourceError::DuplicateLabel {
        resource: "db".to_string(),
        label: "schema".to_string(),
    };
    assert_eq!(
        duplicate.to_string(),
        "Resource 'db' already declares a dependency labelled 'schema'"
    );

    let missing = ResourceError::MissingDependency("schema".to_string());
    assert_eq!(missing.to_string(), "No resource bound under label 'schema'");

    let mismatch = ResourceError::TypeMismatch {
        label: "schema".to_string(),
        expected: "alloc::string::String",
    };
    assert_eq!(
        mismatch.to_string(),
        "Resource bound under 'schema' is not a alloc::string::String"
    );

    let in_use = ResourceError::InUse("db".to_string());
    assert_eq!(in_use.to_string(), "Resource 'db' cannot change its dependencies while in use");
}

#[test]
fn test_failed_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
    let error = ResourceError::failed("tempdir", io);

    assert_eq!(error.to_string(), "Resource 'tempdir' failed: locked");
    let source = error.source().expect("source should be kept");
    let io = source.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
}

#[test]
fn test_other_variants_have_no_source() {
    assert!(ResourceError::OverReleased("x".to_string()).source().is_none());
    assert!(ResourceError::Circular(Vec::new()).source().is_none());
}

#[test]
fn test_result_alias() {
    fn make() -> ResourceResult<u32> {
        Ok(7)
    }

    fn fail() -> ResourceResult<u32> {
        Err(ResourceError::NotImplemented("x".to_string()))
    }

    assert_eq!(make().unwrap(), 7);
    assert!(matches!(fail(), Err(ResourceError::NotImplemented(_))));
}
