// Fixtures shared by the unit tests.

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;

/// Make `path` impossible to remove. Returns `false` when this process can
/// still remove it anyway (no `chattr`, and privileged enough to ignore
/// directory permissions), in which case the caller should skip its checks.
pub fn make_undeletable(path: &Path) -> bool {
    let immutable = Command::new("chattr")
        .arg("+i")
        .arg(path)
        .status()
        .is_ok_and(|status| status.success());
    if immutable {
        return true;
    }

    lock_parent(path)
}

#[cfg(unix)]
fn lock_parent(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    let Some(parent) = path.parent() else {
        return false;
    };
    fs::set_permissions(parent, fs::Permissions::from_mode(0o555)).unwrap();
    let scratch = parent.join(".write-check");
    if fs::write(&scratch, b"").is_ok() {
        let _ = fs::remove_file(&scratch);
        make_deletable(path);
        return false;
    }
    true
}

#[cfg(not(unix))]
fn lock_parent(_path: &Path) -> bool {
    false
}

pub fn make_deletable(path: &Path) {
    let _ = Command::new("chattr").arg("-i").arg(path).status();

    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(parent, fs::Permissions::from_mode(0o755));
    }
}

/// Write a small JPEG whose EXIF block records `taken` (`YYYY:MM:DD HH:MM:SS`)
/// as its `DateTimeOriginal`.
pub fn write_jpeg_taken_at(path: &Path, taken: &str) {
    let field = Field {
        tag: Tag::DateTimeOriginal,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![taken.as_bytes().to_vec()]),
    };
    let mut writer = Writer::new();
    writer.push_field(&field);
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut jpeg = Cursor::new(Vec::new());
    RgbImage::from_pixel(16, 16, Rgb([90, 120, 200]))
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();

    // APP1 segment right after SOI: marker, length (includes itself), "Exif\0\0", TIFF data.
    let mut bytes = jpeg[..2].to_vec();
    bytes.extend_from_slice(&[0xFF, 0xE1]);
    bytes.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    bytes.extend_from_slice(b"Exif\0\0");
    bytes.extend_from_slice(&tiff);
    bytes.extend_from_slice(&jpeg[2..]);
    fs::write(path, bytes).unwrap();
}
