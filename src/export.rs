//! Plain-text documents for saving a course or the whole conversation.

use crate::course::Itinerary;
use crate::datetime;
use crate::schedule::{build_timeline, render_table};
use crate::session::{Role, Session};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const COURSE_TITLE: &str = "🎈 추천 데이트 코스";
pub const TIMELINE_TITLE: &str = "📅 예상 시간표";
pub const CLOSING_NOTES: &str = "> 💡 **참고**\n\
> - 각 활동의 소요 시간은 예상 시간이며, 실제와 다를 수 있습니다.\n\
> - 🔗를 클릭하면 네이버 지도로 이동합니다.";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no course to save yet")]
    NothingToSave,
    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// The latest course with its timeline, or `None` before the first turn completes.
///
/// The timeline starts at the time named in the most recent request.
pub fn course_document(session: &Session) -> Option<String> {
    let text = session.last_itinerary()?;
    let start = session
        .last_request()
        .map(datetime::start_time)
        .unwrap_or_else(datetime::default_start);
    let timeline = build_timeline(&Itinerary::new(text).stops(), start);

    Some(
        [
            format!("{}\n", COURSE_TITLE),
            text.to_string(),
            format!("\n{}", TIMELINE_TITLE),
            render_table(&timeline),
            format!("\n{}", CLOSING_NOTES),
        ]
        .join("\n"),
    )
}

/// Every message, labelled by speaker
pub fn transcript_document(session: &Session) -> String {
    session
        .history()
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::User => "👤 사용자",
                Role::Assistant => "🤖 챗봇",
            };
            format!("{}:\n{}\n", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export_filename(now: DateTime<Local>) -> String {
    format!("date_course_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Write `content` under `dir` with a timestamped name
pub fn save(dir: &Path, content: &str, now: DateTime<Local>) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(now));
    std::fs::write(&path, content)?;
    info!(path = %path.display(), bytes = content.len(), "Saved course");
    Ok(path)
}

/// Save the latest course
pub fn save_course(dir: &Path, session: &Session) -> Result<PathBuf, ExportError> {
    let content = course_document(session).ok_or(ExportError::NothingToSave)?;
    save(dir, &content, Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filename_uses_timestamp() {
        let now = Local.with_ymd_and_hms(2026, 10, 19, 21, 5, 9).unwrap();
        assert_eq!(export_filename(now), "date_course_20261019_210509.txt");
    }

    #[test]
    fn nothing_to_save_on_empty_session() {
        let session = Session::new();
        assert_eq!(course_document(&session), None);
        assert_eq!(transcript_document(&session), "");

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            save_course(dir.path(), &session),
            Err(ExportError::NothingToSave)
        ));
    }

    #[test]
    fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let path = save(&dir.path().join("out"), "본문", now).unwrap();
        assert!(path.ends_with("date_course_20260102_030405.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "본문");
    }
}
