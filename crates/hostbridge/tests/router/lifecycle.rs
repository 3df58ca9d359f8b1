use anyhow::{Context, Result};
use hostbridge::{Error, ErrorKind, RouterSpec, local::LocalVm};

use super::common::{Bridge, EchoRouter, cstr, ready_bridge, vm};

fn assert_sentinels(bridge: &Bridge) {
    let name = cstr("Echo.Identity");
    assert!(!bridge.can(&name));
    assert!(bridge.call(&name, Some(&cstr(r#"{"a":1}"#))).is_none());
    assert!(bridge.call(&name, None).is_none());
}

#[test]
fn unset_runtime_is_environment_unavailable() {
    let bridge = Bridge::new();

    let err = bridge.try_can(&cstr("Echo.Identity")).unwrap_err();
    assert!(matches!(err, Error::RuntimeUnset), "unexpected error: {err}");
    assert_eq!(err.kind(), ErrorKind::EnvironmentUnavailable);

    let err = bridge.initialize(&RouterSpec::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EnvironmentUnavailable);

    assert_sentinels(&bridge);
}

#[test]
fn missing_router_type_fails_every_call() -> Result<()> {
    let bridge = Bridge::new();
    bridge.register_runtime(LocalVm::new())?;

    let err = bridge.initialize(&RouterSpec::default()).unwrap_err();
    assert!(
        matches!(err, Error::RouterNotFound { .. }),
        "unexpected error: {err}"
    );
    assert_eq!(err.kind(), ErrorKind::Initialization);
    assert!(!bridge.is_ready());

    let err = bridge.try_call(&cstr("Echo.Identity"), None).unwrap_err();
    assert!(matches!(err, Error::NotInitialized), "unexpected error: {err}");
    assert_sentinels(&bridge);
    Ok(())
}

#[test]
fn missing_entry_point_fails_initialization() -> Result<()> {
    let defined = RouterSpec::default();
    let requested = RouterSpec {
        invoke_method: "nativeCall".to_string(),
        ..RouterSpec::default()
    };

    let bridge = Bridge::new();
    bridge.register_runtime(LocalVm::new().with_router(&defined, EchoRouter))?;

    let err = bridge.initialize(&requested).unwrap_err();
    let Error::EntryPointNotFound { name, signature, .. } = &err else {
        panic!("expected missing entry point, got {err}");
    };
    assert_eq!(name, "nativeCall");
    assert_eq!(
        *signature,
        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;"
    );
    assert_eq!(err.kind(), ErrorKind::Initialization);
    assert_sentinels(&bridge);
    Ok(())
}

#[test]
fn custom_router_names_resolve() -> Result<()> {
    let spec = RouterSpec {
        class: "org/acme/bridge/Router".to_string(),
        exists_method: "has".to_string(),
        invoke_method: "run".to_string(),
    };
    let bridge = Bridge::new();
    bridge.register_runtime(LocalVm::new().with_router(&spec, EchoRouter))?;
    bridge.initialize(&spec)?;

    assert!(bridge.can(&cstr("Echo.Identity")));
    Ok(())
}

#[test]
fn second_initialization_keeps_published_handle() -> Result<()> {
    let bridge = ready_bridge(EchoRouter)?;

    // A spec that would not resolve proves nothing is resolved again.
    let elsewhere = RouterSpec {
        class: "org/acme/Missing".to_string(),
        ..RouterSpec::default()
    };
    bridge
        .initialize(&elsewhere)
        .context("second initialization should be a no-op")?;

    assert!(bridge.is_ready());
    let result = bridge
        .call(&cstr("Echo.Identity"), Some(&cstr(r#"{"a":1}"#)))
        .context("bridge stopped routing after re-initialization")?;
    assert_eq!(result.as_bytes(), br#"{"a":1}"#);
    Ok(())
}

#[test]
fn runtime_registers_once() -> Result<()> {
    let bridge = ready_bridge(EchoRouter)?;
    let err = bridge.register_runtime(LocalVm::new()).unwrap_err();
    assert!(
        matches!(err, Error::RuntimeAlreadySet),
        "unexpected error: {err}"
    );
    assert!(bridge.can(&cstr("Echo.Identity")));
    Ok(())
}

#[test]
fn refused_attach_is_environment_unavailable() -> Result<()> {
    let bridge = Bridge::new();
    bridge.register_runtime(LocalVm::refusing_attach())?;

    let err = bridge.initialize(&RouterSpec::default()).unwrap_err();
    assert!(matches!(err, Error::Attach(_)), "unexpected error: {err}");
    assert_eq!(err.kind(), ErrorKind::EnvironmentUnavailable);
    assert_sentinels(&bridge);
    Ok(())
}

#[test]
fn threads_attach_once_on_first_use() -> Result<()> {
    let bridge = ready_bridge(EchoRouter)?;
    assert_eq!(vm(&bridge).attach_count(), 1);

    for _ in 0..5 {
        assert!(bridge.can(&cstr("Echo.Identity")));
    }
    assert_eq!(vm(&bridge).attach_count(), 1);

    std::thread::scope(|s| {
        s.spawn(|| -> Result<()> {
            let first = bridge.environment().acquire()?;
            assert!(first.newly_attached());
            drop(first);

            let again = bridge.environment().acquire()?;
            assert!(!again.newly_attached());
            drop(again);

            assert!(bridge.can(&cstr("Echo.Identity")));
            Ok(())
        })
        .join()
        .expect("worker thread panicked")
    })?;

    assert_eq!(vm(&bridge).attach_count(), 2);
    Ok(())
}
