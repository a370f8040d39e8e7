use phantom_trax::{HistoryEntry, RemixHistory};

fn entry(n: usize) -> HistoryEntry {
    HistoryEntry {
        prompt: format!("prompt {n}"),
        output_url: format!("https://out/{n}.wav"),
        timestamp: format!("2024-05-01 12:00:0{n}"),
        seed: if n % 2 == 0 { String::new() } else { n.to_string() },
    }
}

#[test]
fn newest_entry_comes_first() {
    let mut history = RemixHistory::new();
    assert!(history.is_empty());
    assert!(history.latest().is_none());

    for n in 1..=3 {
        history.record(entry(n));
        assert_eq!(history.latest(), Some(&entry(n)));
    }

    let prompts: Vec<&str> = history.entries().map(|e| e.prompt.as_str()).collect();
    assert_eq!(prompts, ["prompt 3", "prompt 2", "prompt 1"]);
    assert_eq!(history.len(), 3);
}

#[test]
fn entries_keep_their_fields() {
    let mut history = RemixHistory::new();
    history.record(entry(1));
    history.record(entry(2));

    let latest = history.latest().unwrap();
    assert_eq!(latest.seed, "");
    assert_eq!(latest.output_url, "https://out/2.wav");
    assert_eq!(history.entries().nth(1).unwrap().seed, "1");
}
