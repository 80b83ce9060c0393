use urlstate_core::prelude::*;
use urlstate_history::History;

use crate::ui;

const PARAMS: &[&str] = &["demo_count", "demo_filter"];

pub fn run(history: &History) -> anyhow::Result<()> {
    let store = history.store();
    let ctx = SlotContext::new(store.handle());
    let count = ctx.slot("demo_count", FromStrCodec::<i64>::new(), SlotOptions::new(0));
    let filter = ctx.slot("demo_filter", TextCodec, SlotOptions::new(String::new()));

    ui::step("start", store, PARAMS);
    count.update(|c| *c += 1);
    count.update(|c| *c += 1);
    ui::step(&format!("increment x2 (count = {})", count.get()), store, PARAMS);
    filter.set("active users".into());
    ui::step("filter = \"active users\"", store, PARAMS);
    count.update(|c| *c -= 1);
    ui::step(&format!("decrement (count = {})", count.get()), store, PARAMS);

    history.back();
    ui::step(&format!("browser back (count = {})", count.get()), store, PARAMS);
    history.forward();
    ui::step(&format!("browser forward (count = {})", count.get()), store, PARAMS);

    filter.reset();
    count.set(0);
    ui::step("reset both to defaults", store, PARAMS);

    history.push("?demo_count=oops")?;
    ui::step(
        &format!("hand-edited URL (count = {})", count.get()),
        store,
        PARAMS,
    );
    Ok(())
}
