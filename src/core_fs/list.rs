use super::FileInfo;
use chrono::{DateTime, Datelike, Utc};

/// Render one `ls -l` style line for a directory listing.
pub fn list_line(fi: &FileInfo) -> String {
    let nlinks = 1;
    let user = "user";
    let group = "group";
    format!(
        "{:>10} {} {:>6} {:>6} {:>7} {:>12} {}",
        mode_string(fi),
        nlinks,
        user,
        group,
        fi.size,
        format_mtime(&fi.modified),
        fi.name
    )
}

/// Ten characters: the directory flag followed by the rwx triples.
fn mode_string(fi: &FileInfo) -> String {
    let mut s = String::with_capacity(10);
    s.push(if fi.is_dir { 'd' } else { '-' });
    for shift in [6u32, 3, 0] {
        let bits = (fi.mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

/// Month, space-padded day and time within the current calendar year, the
/// year instead of the time otherwise.
fn format_mtime(t: &DateTime<Utc>) -> String {
    if t.year() == Utc::now().year() {
        t.format("%b %e %H:%M").to_string()
    } else {
        t.format("%b %e %Y").to_string()
    }
}
