// `receive` copies the pending message into the caller's buffer; it never
// hands back a borrow tied to the call. A buffer local to this function
// still can't be smuggled out by reference afterward — ordinary borrowck,
// confirming there's no path for an output borrow to escape past `receive`.

use std::sync::atomic::AtomicBool;

use tag_engine::{Credentials, OpenCommand, Permission, TagConfig, TagEngine};

fn smuggle() -> &'static [u8] {
    let engine = TagEngine::new(TagConfig::default());
    let cancel = AtomicBool::new(false);
    let creds = Credentials::root();
    let slot = engine
        .open(1, OpenCommand::Create, Permission::All, creds, &cancel)
        .unwrap();

    let mut buf = [0u8; 4];
    let _ = engine.receive(slot, 0, &mut buf, creds, &cancel);
    &buf
    //~^ ERROR: cannot return value referencing local variable `buf`
}

fn main() {}
