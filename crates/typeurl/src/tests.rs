use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::*;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Test {
    name: String,
    age: i64,
}

crate::message!(Test);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Other {
    id: u32,
}

crate::message!(Other, Postcard);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Ping {
    seq: u64,
}

crate::message!(Ping, Json, "example.com/Ping");

/// JSON refuses maps whose keys are not strings.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Grid {
    cells: HashMap<(u8, u8), u8>,
}

crate::message!(Grid);

fn koye() -> Test {
    Test { name: "koye".to_string(), age: 6 }
}

// ============================================================================
//  NAMES
// ============================================================================

#[test]
fn test_join_single_name() {
    assert_eq!(join_names(&["test"]), "test");
}

#[test]
fn test_join_segments() {
    assert_eq!(join_names(&["test", "two"]), "test/two");
    assert_eq!(join_names(&["test/", "/two"]), "test/two");
    assert_eq!(join_names(&["test", "", "two", "three"]), "test/two/three");
    assert_eq!(join_names(&["types.example.com/pkg", "Test"]), "types.example.com/pkg/Test");
}

#[test]
fn test_join_empty() {
    assert_eq!(join_names(&[]), "");
    assert_eq!(join_names(&[""]), "");
    assert_eq!(join_names(&["."]), "");
}

#[test]
fn test_join_cleans_path() {
    assert_eq!(join_names(&["/", "two"]), "/two");
    assert_eq!(join_names(&["a//b", "c"]), "a/b/c");
    assert_eq!(join_names(&["a", "./b", "../c"]), "a/c");
    assert_eq!(join_names(&["/a", "..", "..", "b"]), "/b");
    assert_eq!(join_names(&["..", "a"]), "../a");
    assert_eq!(join_names(&["", "two"]), "two");
}

#[test]
fn test_identity_ignores_name_for_equality() {
    assert_eq!(TypeIdentity::of::<Test>(), TypeIdentity::of::<Test>());
    assert_ne!(TypeIdentity::of::<Test>(), TypeIdentity::of::<Other>());
    assert!(TypeIdentity::of::<Test>().name().ends_with("Test"));
}

// ============================================================================
//  REGISTRY
// ============================================================================

#[test]
fn test_register_then_resolve() {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    assert_eq!(registry.resolve(TypeIdentity::of::<Test>()).as_deref(), Some("test"));
    assert_eq!(registry.resolve_name("test"), Some(TypeIdentity::of::<Test>()));
    assert!(registry.contains::<Test>());
    assert!(!registry.contains::<Other>());
}

#[test]
fn test_register_is_idempotent() {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);
    registry.register::<Test>(&["test"]);
    assert_eq!(registry.try_register::<Test>(&["test"]), Ok(()));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.entries(), vec![(TypeIdentity::of::<Test>(), "test".to_string())]);
}

#[test]
fn test_register_joined_names_match_joined_url() {
    let registry = Registry::new();
    registry.register::<Test>(&["test", "two"]);
    registry.register::<Test>(&["test/two"]);
    assert_eq!(registry.resolve(TypeIdentity::of::<Test>()).as_deref(), Some("test/two"));
}

#[test]
#[should_panic(expected = "already registered as")]
fn test_register_different_urls_panics() {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);
    registry.register::<Test>(&["test", "two"]);
}

#[test]
fn test_try_register_reports_url_mismatch() {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    let conflict = registry.try_register::<Test>(&["test", "two"]).unwrap_err();
    assert_eq!(
        conflict,
        RegistrationConflict::UrlMismatch {
            type_name: TypeIdentity::of::<Test>().name(),
            existing: "test".to_string(),
            attempted: "test/two".to_string(),
        }
    );
    assert_eq!(registry.resolve(TypeIdentity::of::<Test>()).as_deref(), Some("test"));
    assert_eq!(registry.resolve_name("test/two"), None);
}

#[test]
fn test_try_register_reports_url_taken() {
    let registry = Registry::new();
    registry.register::<Test>(&["shared"]);

    let conflict = registry.try_register::<Other>(&["shared"]).unwrap_err();
    assert!(matches!(conflict, RegistrationConflict::UrlTaken { ref url, .. } if url == "shared"));
    assert!(!registry.contains::<Other>());
    assert_eq!(registry.resolve_name("shared"), Some(TypeIdentity::of::<Test>()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_try_register_rejects_empty_name() {
    let registry = Registry::new();
    let conflict = registry.try_register::<Test>(&[]).unwrap_err();
    assert!(matches!(conflict, RegistrationConflict::EmptyName { .. }));
    assert!(registry.is_empty());
}

#[test]
fn test_register_pointer_resolves_pointee() {
    let registry = Registry::new();
    registry.register_value(&Box::new(Test::default()), &["test"]);

    assert_eq!(registry.resolve(TypeIdentity::of::<Test>()).as_deref(), Some("test"));
    assert!(registry.contains::<Test>());
    assert_eq!(registry.type_url_of(&Arc::new(koye())), Ok("test".to_string()));
}

#[test]
fn test_clear_empties_both_directions() {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);
    registry.clear();

    assert!(registry.is_empty());
    assert_eq!(registry.resolve_name("test"), None);
    registry.register::<Test>(&["test", "two"]);
    assert_eq!(registry.resolve(TypeIdentity::of::<Test>()).as_deref(), Some("test/two"));
}

// ============================================================================
//  MARSHAL
// ============================================================================

#[test]
fn test_marshal_sets_url() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    let envelope = registry.marshal(&koye())?;
    assert_eq!(envelope.type_url, "test");
    assert_eq!(envelope.value, serde_json::to_vec(&koye()).unwrap());
    Ok(())
}

#[test]
fn test_marshal_any_is_identity_on_envelopes() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    let envelope = registry.marshal_any(Arc::new(koye()))?;
    assert_eq!(envelope.type_url, "test");

    let again = registry.marshal_any(envelope.clone())?;
    assert!(Arc::ptr_eq(&envelope, &again));
    Ok(())
}

#[test]
fn test_marshal_envelope_by_reference_copies_it() -> Result<()> {
    let registry = Registry::new();
    let envelope = Envelope::new("anything", vec![1, 2, 3]);
    assert_eq!(registry.marshal(&envelope)?, envelope);
    Ok(())
}

#[test]
fn test_marshal_reports_encode_failure() {
    let registry = Registry::new();
    registry.register::<Grid>(&["grid"]);

    let grid = Grid { cells: HashMap::from([((1, 2), 3)]) };
    let err = registry.marshal(&grid).unwrap_err();
    match &err {
        Error::Payload { type_url, source } => {
            assert_eq!(type_url, "grid");
            assert!(matches!(source, PayloadError::Encode { codec: "json", .. }));
            let cause = std::error::Error::source(source).expect("codec error");
            assert!(cause.is::<serde_json::Error>());
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let shared = registry.marshal_any(Arc::new(grid)).unwrap_err();
    assert!(matches!(shared, Error::Payload { source: PayloadError::Encode { .. }, .. }));
    assert_eq!(shared, err);
}

#[test]
fn test_marshal_any_rewraps_nested_envelope() -> Result<()> {
    let registry = Registry::new();
    let envelope = Arc::new(Envelope::new("test", vec![1, 2, 3]));

    let nested: Arc<dyn Message> = Arc::new(Arc::clone(&envelope));
    let again = registry.marshal_any(nested)?;
    assert!(!Arc::ptr_eq(&envelope, &again));
    assert_eq!(*again, *envelope);
    Ok(())
}

#[test]
fn test_marshal_unregistered_fails() {
    let registry = Registry::new();
    let err = registry.marshal_any(Arc::new(koye())).unwrap_err();
    assert_eq!(err, Error::UnregisteredType { type_name: TypeIdentity::of::<Test>().name() });
}

#[test]
fn test_self_naming_bypasses_registry() -> Result<()> {
    let registry = Registry::new();
    let envelope = registry.marshal_any(Arc::new(Ping { seq: 9 }))?;
    assert_eq!(envelope.type_url, "example.com/Ping");
    Ok(())
}

#[test]
fn test_self_naming_takes_precedence() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Ping>(&["registered/ping"]);

    assert_eq!(registry.type_url_of(&Ping::default())?, "example.com/Ping");
    let envelope = registry.marshal(&Ping { seq: 1 })?;
    assert_eq!(envelope.type_url, "example.com/Ping");
    Ok(())
}

// ============================================================================
//  UNMARSHAL
// ============================================================================

#[test]
fn test_marshal_unmarshal() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    let envelope = registry.marshal_any(Arc::new(koye()))?;
    let value = registry.unmarshal_any(&*envelope)?;

    let test = value.downcast_ref::<Test>().expect("expected value to be a Test");
    assert_eq!(test.name, "koye");
    assert_eq!(test.age, 6);
    Ok(())
}

#[test]
fn test_unmarshal_boxed_registration_yields_pointee() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Box<Other>>(&["other"]);

    let envelope = registry.marshal(&Box::new(Other { id: 77 }))?;
    let value = registry.unmarshal_any(&envelope)?;
    assert!(value.is::<Other>());
    assert_eq!(value.downcast::<Other>().map(|b| *b), Some(Other { id: 77 }));
    Ok(())
}

#[test]
fn test_unmarshal_unknown_url() {
    let registry = Registry::new();
    let envelope = Envelope::new("nobody/home", vec![]);
    assert_eq!(
        registry.unmarshal_any(&envelope).unwrap_err(),
        Error::NotFound("nobody/home".to_string())
    );
}

#[test]
fn test_unmarshal_corrupt_payload_keeps_source() {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    let envelope = Envelope::new("test", b"{not json".to_vec());
    let err = registry.unmarshal_any(&envelope).unwrap_err();
    match &err {
        Error::Payload { type_url, source } => {
            assert_eq!(type_url, "test");
            assert!(matches!(source, PayloadError::Decode { codec: "json", .. }));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let payload = std::error::Error::source(&err).expect("payload error");
    assert!(payload.is::<PayloadError>());
    let cause = std::error::Error::source(payload).expect("codec error");
    assert!(cause.is::<serde_json::Error>());
}

#[test]
fn test_unmarshal_postcard_cause_is_reachable() {
    let registry = Registry::new();
    registry.register::<Other>(&["other"]);

    let err = registry.unmarshal_by_type_url("other", &[]).unwrap_err();
    let Error::Payload { source, .. } = &err else {
        panic!("unexpected error: {:?}", err);
    };
    assert_eq!(source.codec(), "postcard");
    let cause = std::error::Error::source(source).expect("codec error");
    assert!(cause.is::<postcard::Error>());
}

#[test]
fn test_unmarshal_by_type_url() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Other>(&["other"]);

    let bytes = Postcard::encode(&Other { id: 3 }).unwrap();
    let value = registry.unmarshal_by_type_url("other", &bytes)?;
    assert_eq!(value.downcast_ref::<Other>(), Some(&Other { id: 3 }));
    Ok(())
}

#[test]
fn test_unmarshal_to_typed() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    let envelope = registry.marshal(&koye())?;
    let test: Test = registry.unmarshal_to(&envelope)?;
    assert_eq!(test, koye());
    Ok(())
}

#[test]
fn test_unmarshal_to_wrong_type() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);
    registry.register::<Other>(&["other"]);

    let envelope = registry.marshal(&koye())?;
    let err = registry.unmarshal_to::<Other, _>(&envelope).unwrap_err();
    assert_eq!(
        err,
        Error::TypeMismatch { expected: "other".to_string(), found: "test".to_string() }
    );
    Ok(())
}

#[test]
fn test_unmarshal_to_self_naming() -> Result<()> {
    let registry = Registry::new();
    let envelope = registry.marshal(&Ping { seq: 4 })?;
    let ping: Ping = registry.unmarshal_to(&envelope)?;
    assert_eq!(ping, Ping { seq: 4 });
    Ok(())
}

// ============================================================================
//  IS
// ============================================================================

#[test]
fn test_is() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);
    registry.register::<Other>(&["other"]);

    let envelope = registry.marshal_any(Arc::new(koye()))?;
    assert!(registry.is(&*envelope, &Test::default()));
    assert!(!registry.is(&*envelope, &Other::default()));
    Ok(())
}

#[test]
fn test_is_unregistered_sample_is_false() {
    let registry = Registry::new();
    let envelope = Envelope::new("test", vec![]);
    assert!(!registry.is(&envelope, &Test::default()));
}

#[test]
fn test_is_self_naming() {
    let registry = Registry::new();
    let envelope = Envelope::new("example.com/Ping", vec![]);
    assert!(registry.is(&envelope, &Ping::default()));
}

// ============================================================================
//  FOREIGN CONTAINERS
// ============================================================================

/// Stand-in for a generated protobuf `Any`.
struct ProtoAny {
    type_url: String,
    value: Vec<u8>,
}

impl AnyLike for ProtoAny {
    fn url(&self) -> &str {
        &self.type_url
    }

    fn payload(&self) -> &[u8] {
        &self.value
    }
}

#[test]
fn test_unmarshal_foreign_any() -> Result<()> {
    let registry = Registry::new();
    registry.register::<Test>(&["test"]);

    let (type_url, value) = registry.marshal(&koye())?.into_parts();
    let foreign = ProtoAny { type_url, value };

    let test: Test = registry.unmarshal_to(&foreign)?;
    assert_eq!(test, koye());
    assert_eq!(Envelope::from_any(&foreign).type_url, "test");
    assert!(registry.is(&foreign, &Test::default()));
    Ok(())
}
