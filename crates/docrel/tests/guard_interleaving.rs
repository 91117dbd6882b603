//! DDL/DML interleaving tests through the engine's admission guard.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use docrel::mem::MemBackend;
use docrel::{DocRelEngine, DocRelError, DocValue, TranslatorConfig};
use serde_json::json;

const LONG: Duration = Duration::from_secs(5);
const SHORT: Duration = Duration::from_millis(50);

fn doc(json: serde_json::Value) -> DocValue {
    DocValue::from_json(json)
}

#[test]
fn write_batch_is_rejected_while_a_schema_handler_is_open() {
    let backend = MemBackend::new();
    let engine = DocRelEngine::open(backend.clone(), TranslatorConfig::default()).unwrap();

    let schema = engine.guard().create_schema_handler(SHORT, || Ok(())).unwrap();

    let mut tx = backend.begin();
    let err = engine
        .write_batch(&mut tx, "shop", "orders", &[doc(json!({"a": 1}))], SHORT)
        .unwrap_err();
    assert!(matches!(err, DocRelError::Timeout { .. }));
    assert!(err.is_transient());

    // Nothing leaked: once the schema handler closes, the batch goes
    // through immediately.
    schema.close().unwrap();
    let mut tx = backend.begin();
    engine
        .write_batch(&mut tx, "shop", "orders", &[doc(json!({"a": 1}))], SHORT)
        .unwrap();
}

#[test]
fn blocked_write_batch_proceeds_when_the_schema_handler_closes() {
    let backend = MemBackend::new();
    let engine =
        Arc::new(DocRelEngine::open(backend.clone(), TranslatorConfig::default()).unwrap());

    let schema = engine.guard().create_schema_handler(SHORT, || Ok(())).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let writer = {
        let engine = Arc::clone(&engine);
        let backend = backend.clone();
        thread::spawn(move || {
            let mut tx = backend.begin();
            engine
                .write_batch(&mut tx, "shop", "orders", &[doc(json!({"a": 1}))], LONG)
                .unwrap();
            done_tx.send(()).unwrap();
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(
        done_rx.try_recv().is_err(),
        "write batch ran while the schema handler was open"
    );

    schema.close().unwrap();
    done_rx.recv_timeout(LONG).expect("write batch never admitted");
    writer.join().unwrap();

    assert!(engine.snapshot().database("shop").is_some());
}

#[test]
fn schema_handler_waits_for_open_write_admissions() {
    let backend = MemBackend::new();
    let engine = DocRelEngine::open(backend, TranslatorConfig::default()).unwrap();

    // Hold a raw data-transaction admission, as a long-running DML caller
    // would.
    let admission = engine.guard().create_transaction(SHORT, || Ok(())).unwrap();

    let err = engine
        .guard()
        .create_schema_handler(SHORT, || Ok(()))
        .unwrap_err();
    assert!(matches!(err, DocRelError::Timeout { .. }));

    admission.close().unwrap();
    engine
        .guard()
        .create_schema_handler(SHORT, || Ok(()))
        .unwrap()
        .close()
        .unwrap();
}
