use urlstate_core::prelude::*;
use urlstate_history::History;

use crate::ui;

const PARAMS: &[&str] = &["name", "email", "job", "company"];

pub fn run(history: &History) -> anyhow::Result<()> {
    let store = history.store();
    let ctx = SlotContext::new(store.handle());
    let fields: Vec<BoundSlot<String>> = PARAMS
        .iter()
        .map(|k| ctx.slot(*k, TextCodec, SlotOptions::new(String::new())))
        .collect();
    let values = ["Ada Lovelace", "ada@example.com", "Analyst", "Engines Ltd"];

    let before = history.len();
    for (slot, v) in fields.iter().zip(values) {
        slot.set(v.to_string());
    }
    ui::step(
        &format!("4 separate sets: +{} entries", history.len() - before),
        store,
        PARAMS,
    );

    for slot in &fields {
        slot.reset();
    }
    let before = history.len();
    store.run_batched(|| {
        for (slot, v) in fields.iter().zip(values) {
            slot.set(v.to_uppercase());
        }
    });
    ui::step(
        &format!("batched sets: +{} entry", history.len() - before),
        store,
        PARAMS,
    );

    history.back();
    ui::step("browser back (one step)", store, PARAMS);
    Ok(())
}
