//! Run with `RUST_LOG=debug cargo run --example basic` to see the engine's
//! own `log` output at each rendezvous decision point.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tag_engine::{ControlCommand, Credentials, OpenCommand, Permission, TagConfig, TagEngine};

fn main() {
    env_logger::init();

    let engine = Arc::new(TagEngine::new(TagConfig::default()));
    let cancel = AtomicBool::new(false);
    let creds = Credentials::root();

    let slot = engine
        .open(1, OpenCommand::Create, Permission::All, creds, &cancel)
        .expect("create a fresh shared instance");

    let mut receivers = Vec::new();
    for id in 0..3 {
        let e = engine.clone();
        receivers.push(thread::spawn(move || {
            let cancel = AtomicBool::new(false);
            let mut buf = [0u8; 32];
            let n = e
                .receive(slot, 0, &mut buf, Credentials::root(), &cancel)
                .expect("receive delivered message");
            println!("receiver {id} got {:?}", &buf[..n]);
        }));
    }

    thread::sleep(Duration::from_millis(30));
    engine
        .send(slot, 0, b"hello from the demo", creds, &cancel)
        .expect("send to the registered cohort");

    for r in receivers {
        r.join().unwrap();
    }

    engine
        .control(slot, ControlCommand::Remove, creds, &cancel)
        .expect("tear the instance down");
}
