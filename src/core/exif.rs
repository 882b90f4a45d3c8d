use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use log::debug;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Tags tried in order when looking for the capture date.
const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Capture date from the file's EXIF block, if it has one.
pub fn date_from_exif(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut buf_reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf_reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No EXIF data in {}: {}", path.display(), e);
            return None;
        }
    };

    DATE_TAGS.iter().find_map(|tag| {
        exif.get_field(*tag, In::PRIMARY)
            .and_then(|field| ascii_value(&field.value))
            .and_then(|s| parse_exif_datetime(&s))
    })
}

/// Oldest of the creation and modification timestamps, in local time.
pub fn date_from_os(path: &Path) -> std::io::Result<NaiveDateTime> {
    let metadata = fs::metadata(path)?;
    let modified = metadata.modified()?;
    let oldest = match metadata.created() {
        Ok(created) => created.min(modified),
        Err(_) => modified,
    };
    Ok(DateTime::<Local>::from(oldest).naive_local())
}

/// Date used to order files: EXIF capture date, falling back to the filesystem date.
pub fn organization_date(path: &Path) -> std::io::Result<NaiveDateTime> {
    match date_from_exif(path) {
        Some(date) => Ok(date),
        None => date_from_os(path),
    }
}

pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), EXIF_DATE_FORMAT).ok()
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(vec) => vec.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .to_string()
        }),
        _ => None,
    }
}
