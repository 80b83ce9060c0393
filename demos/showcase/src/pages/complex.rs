use serde::{Deserialize, Serialize};
use urlstate_core::prelude::*;
use urlstate_history::History;

use crate::ui;

const PARAMS: &[&str] = &["state"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: String,
    pub notifications: bool,
    pub date: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "dark".into(),
            notifications: true,
            date: "2024-01-01".into(),
        }
    }
}

impl DelimitedRecord for Preferences {
    const ARITY: usize = 3;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.theme.clone(),
            encode_flag(self.notifications).into(),
            self.date.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Result<Self, DecodeError> {
        Ok(Self {
            theme: required("theme", fields[0])?.into(),
            notifications: decode_flag(fields[1]),
            date: required("date", fields[2])?.into(),
        })
    }
}

fn show(action: &str, mode: &ModeSwitch<Preferences>, store: &QueryStore) {
    let p = mode.get();
    ui::step(action, store, PARAMS);
    println!(
        "  {:<34} [{}] theme={} notifications={} date={}",
        "",
        mode.active(),
        p.theme,
        p.notifications,
        p.date
    );
}

pub fn run(history: &History) -> anyhow::Result<()> {
    let store = history.store();
    let registry = CodecRegistry::new()
        .with("json", JsonCodec::<Preferences>::new())
        .with("custom", DelimitedCodec::<Preferences>::new());
    let mode = ModeSwitch::new(
        store.handle(),
        "state",
        SlotOptions::new(Preferences::default()),
        registry,
        "json",
    )?;

    show("start", &mode, store);
    mode.update(|p| p.theme = if p.theme == "dark" { "light" } else { "dark" }.into());
    show("toggle theme", &mode, store);
    mode.update(|p| p.notifications = !p.notifications);
    show("toggle notifications", &mode, store);
    mode.update(|p| p.date = "2024-06-01".into());
    show("pick 2024-06-01", &mode, store);

    mode.switch_to("custom")?;
    show("switch to CUSTOM (JSON unreadable)", &mode, store);
    mode.update(|p| p.theme = "light".into());
    show("toggle theme", &mode, store);
    mode.update(|p| p.notifications = false);
    show("toggle notifications", &mode, store);

    mode.switch_to("json")?;
    show("switch to JSON (custom unreadable)", &mode, store);

    if let Err(e) = mode.switch_to("yaml") {
        println!("  switch to yaml refused: {e}");
    }

    history.go(-2);
    show("browser back x2", &mode, store);
    Ok(())
}
