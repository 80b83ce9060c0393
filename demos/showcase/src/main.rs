use urlstate_core::QueryStore;
use urlstate_history::History;

mod ui;
mod pages {
    pub mod basic;
    pub mod batch;
    pub mod complex;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Page {
    Basic,
    Batch,
    Complex,
}

impl Page {
    const ALL: [Page; 3] = [Page::Basic, Page::Batch, Page::Complex];

    fn title(self) -> &'static str {
        match self {
            Page::Basic => "Basic URL State",
            Page::Batch => "Batch Updates",
            Page::Complex => "Complex State",
        }
    }

    fn from_arg(arg: &str) -> Option<Page> {
        match arg {
            "basic" => Some(Page::Basic),
            "batch" => Some(Page::Batch),
            "complex" => Some(Page::Complex),
            _ => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let pages: Vec<Page> = match std::env::args().nth(1) {
        Some(arg) => vec![
            Page::from_arg(&arg)
                .ok_or_else(|| anyhow::anyhow!("unknown page `{arg}` (basic, batch, complex)"))?,
        ],
        None => Page::ALL.to_vec(),
    };

    for page in pages {
        // Each demo gets its own address bar.
        let history = History::new(QueryStore::new());
        ui::heading(page.title());
        match page {
            Page::Basic => pages::basic::run(&history)?,
            Page::Batch => pages::batch::run(&history)?,
            Page::Complex => pages::complex::run(&history)?,
        }
        log::info!("{}: {} history entries", page.title(), history.len());
    }
    Ok(())
}
