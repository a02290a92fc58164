use colored::Colorize;
use tn_core::{MicChannel, Note, NoteKind, Session};

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn subheader(title: &str) {
    println!("{}", title.bold());
}

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn info(msg: &str) {
    eprintln!("{} {}", "info:".blue().bold(), msg);
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn kind_label(kind: NoteKind) -> colored::ColoredString {
    match kind {
        NoteKind::Quick => "quick ".normal(),
        NoteKind::Long => "long  ".magenta(),
        NoteKind::Custom => "custom".yellow()
    }
}

pub fn note_line(note: &Note) -> String {
    let span = if note.timecode_in == note.timecode_out {
        format!("{:<11}   {:<11}", note.timecode_in, "")
    } else {
        format!("{:<11} → {:<11}", note.timecode_in, note.timecode_out)
    };
    let line = format!(
        "{}  {}  {}  {}",
        span.cyan(),
        kind_label(note.kind),
        note.text,
        note.id.dimmed()
    );
    if note.deleted {
        format!("{} {}", line.strikethrough().dimmed(), "(deleted)".red())
    } else {
        line
    }
}

pub fn mic_line(mic: &MicChannel) -> String {
    let wearer = mic.current_person().unwrap_or("unassigned");
    format!(
        "  Mic {:>2}  {:<10}  {}",
        mic.number,
        mic.frequency,
        wearer.bold()
    )
}

pub fn session_line(session: &Session, current: bool) -> String {
    let marker = if current { "*".green().bold() } else { " ".normal() };
    format!(
        "{} {}  {}  {} notes  {} fps  {}",
        marker,
        session.name.bold(),
        session.created_at.format("%Y-%m-%d %H:%M"),
        session.live_note_count(),
        session.fps,
        session.id.dimmed()
    )
}

pub fn print_session(session: &Session, include_deleted: bool) {
    header(&session.name);
    println!(
        "  {} fps  offset {} ms  {}",
        session.fps,
        session.tc_offset,
        session.id.dimmed()
    );

    let filled: Vec<_> = session
        .metadata
        .iter()
        .filter(|f| !f.value.trim().is_empty())
        .collect();
    if !filled.is_empty() {
        println!();
        subheader("Metadata");
        for field in filled {
            println!("  {:<12} {}", field.label, field.value);
        }
    }

    if !session.mics.is_empty() {
        println!();
        subheader("Mics");
        for mic in &session.mics {
            println!("{}", mic_line(mic));
        }
    }

    println!();
    subheader("Notes");
    let mut shown = 0;
    for note in session
        .notes
        .iter()
        .filter(|n| include_deleted || n.is_live())
    {
        println!("  {}", note_line(note));
        shown += 1;
    }
    if shown == 0 {
        hint("No notes yet. Add one with `takenote note add <text>`");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tn_core::FrameRate;

    fn note(kind: NoteKind) -> Note {
        Note::instant(
            "note_1".to_string(),
            "10:00:00:00".to_string(),
            "Boom in frame".to_string(),
            kind,
            Utc.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap()
        )
    }

    #[test]
    fn test_header_does_not_panic() {
        header("Test Header");
    }

    #[test]
    fn test_hint_does_not_panic() {
        hint("This is a hint");
    }

    #[test]
    fn test_info_and_warn_do_not_panic() {
        info("This is info");
        warn("This is a warning");
    }

    #[test]
    fn test_success_does_not_panic() {
        success("This is success");
    }

    #[test]
    fn test_note_line_carries_timecode_and_text() {
        colored::control::set_override(false);
        let line = note_line(&note(NoteKind::Quick));
        assert!(line.starts_with("10:00:00:00"));
        assert!(line.contains("Boom in frame"));
        assert!(line.contains("note_1"));
        assert!(!line.contains('→'));
    }

    #[test]
    fn test_long_note_shows_span() {
        colored::control::set_override(false);
        let mut long = note(NoteKind::Long);
        long.timecode_out = "10:00:05:00".to_string();
        assert!(note_line(&long).contains("10:00:00:00 → 10:00:05:00"));
    }

    #[test]
    fn test_deleted_note_is_marked() {
        colored::control::set_override(false);
        let mut gone = note(NoteKind::Custom);
        gone.deleted = true;
        assert!(note_line(&gone).ends_with("(deleted)"));
    }

    #[test]
    fn test_print_session_does_not_panic() {
        let mut session = Session::new(
            "session_1".to_string(),
            "Day 1".to_string(),
            Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap(),
            FrameRate::Fps25
        );
        session.notes.push(note(NoteKind::Quick));
        session.mics.push(MicChannel::new(1, "518.200".to_string()));
        print_session(&session, true);
    }
}
