use std::path::{Path, PathBuf};

/// Write a device-style beat export with `intervals_ms` and return its path.
pub fn write_beat_file(dir: &Path, name: &str, intervals_ms: &[f64]) -> PathBuf {
    let mut body = String::from("Date,RR,Since Start\n");
    let mut elapsed = 0.0;
    for (idx, rr) in intervals_ms.iter().enumerate() {
        elapsed += rr;
        body.push_str(&format!(
            "2025-03-14 10:00:{:02} +0100,{rr},{elapsed}\n",
            idx % 60
        ));
    }
    let path = dir.join(name);
    std::fs::create_dir_all(dir).expect("create fixture dir");
    std::fs::write(&path, body).expect("write beat fixture");
    path
}

/// Write an event export with `(offset_s, label)` rows and return its path.
pub fn write_event_file(dir: &Path, name: &str, events: &[(f64, &str)]) -> PathBuf {
    let mut body = String::from("Timestamp,Annotation\n");
    for (offset, label) in events {
        body.push_str(&format!("{offset},{label}\n"));
    }
    let path = dir.join(name);
    std::fs::create_dir_all(dir).expect("create fixture dir");
    std::fs::write(&path, body).expect("write event fixture");
    path
}
