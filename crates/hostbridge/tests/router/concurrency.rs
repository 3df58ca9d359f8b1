use anyhow::{Context, Result};
use hostbridge::local::{FunctionRegistry, Parameters};
use serde_json::{Value, json};

use super::common::{cstr, ready_bridge, vm};

const WORKERS: usize = 16;
const CALLS_PER_WORKER: usize = 50;

#[test]
fn concurrent_calls_keep_results_paired() -> Result<()> {
    let registry = FunctionRegistry::new();
    for worker in 0..WORKERS {
        registry.register_fn(format!("Worker.{worker}"), move |params: Parameters| {
            let mut out = Parameters::new();
            out.insert("worker".into(), worker.into());
            out.insert("seq".into(), params.get("seq").cloned().unwrap_or(Value::Null));
            Ok(out)
        });
    }
    let bridge = ready_bridge(registry)?;

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let bridge = &bridge;
                s.spawn(move || -> Result<()> {
                    let name = cstr(&format!("Worker.{worker}"));
                    assert!(bridge.can(&name));
                    for seq in 0..CALLS_PER_WORKER {
                        let params = cstr(&json!({ "seq": seq }).to_string());
                        let result = bridge
                            .call(&name, Some(&params))
                            .with_context(|| format!("worker {worker} call {seq} was empty"))?;
                        let value: Value = serde_json::from_slice(result.as_bytes())?;
                        assert_eq!(value, json!({ "worker": worker, "seq": seq }));
                    }
                    Ok(())
                })
            })
            .collect();

        handles
            .into_iter()
            .try_for_each(|h| h.join().expect("worker thread panicked"))
    })?;

    // Main thread plus one binding per worker.
    assert_eq!(vm(&bridge).attach_count(), WORKERS + 1);
    assert_eq!(vm(&bridge).live_references(), 0);
    Ok(())
}
