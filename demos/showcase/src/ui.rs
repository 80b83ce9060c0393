use urlstate_core::QueryStore;

pub fn heading(title: &str) {
    println!();
    println!("== {title} ==");
}

/// The address bar, showing only the parameters the demo cares about.
pub fn browser_bar(store: &QueryStore, relevant: &[&str]) -> String {
    let shown: Vec<String> = store
        .params()
        .into_iter()
        .filter(|(k, _)| relevant.is_empty() || relevant.contains(&k.as_str()))
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    if shown.is_empty() {
        "demo.local/".to_string()
    } else {
        format!("demo.local/?{}", shown.join("&"))
    }
}

pub fn step(action: &str, store: &QueryStore, relevant: &[&str]) {
    println!("  {action:<34} {}", browser_bar(store, relevant));
}
