// A permission predicate installed on a `TagEngine` must outlive the engine
// itself, so `with_permission_check` requires `'static`. A closure that
// borrows function-local data instead of owning it cannot satisfy that
// bound.

use tag_engine::{TagConfig, TagEngine};

fn main() {
    let flag = true;
    let engine = TagEngine::with_permission_check(TagConfig::default(), |_creds, _inst| flag);
    //~^ ERROR: closure may outlive the current function, but it borrows `flag`
    drop(engine);
}
