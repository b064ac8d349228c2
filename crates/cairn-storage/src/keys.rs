//! Storage key derivation.
//!
//! Key format: `{folder}/{token}-{sanitized}{ext}` where `token` is a random
//! UUIDv4, `sanitized` is the client's base name (extension included) with
//! every non-alphanumeric ASCII character removed, and `ext` is the base
//! name's extension kept verbatim. `photo.jpg` in `images` becomes
//! `images/<uuid>-photojpg.jpg`.

use cairn_core::UploadFolder;
use uuid::Uuid;

/// Derive a fresh storage key for an upload.
///
/// Every call draws a new random token, so two uploads of the same file never
/// share a key.
pub fn derive_storage_key(folder: UploadFolder, original_name: &str) -> String {
    derive_storage_key_with_token(folder, original_name, Uuid::new_v4())
}

pub(crate) fn derive_storage_key_with_token(
    folder: UploadFolder,
    original_name: &str,
    token: Uuid,
) -> String {
    let base = base_name(original_name);
    format!(
        "{}/{}-{}{}",
        folder.as_str(),
        token,
        sanitize(base),
        extension(base)
    )
}

/// Last path component, ignoring trailing separators. Both `/` and `\` count
/// as separators.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Extension of a base name including the leading dot, or `""`.
///
/// A name whose only dot is the leading one (`.env`) has no extension, and
/// neither does `..`.
pub fn extension(base: &str) -> &str {
    match base.rfind('.') {
        None | Some(0) => "",
        Some(_) if base == ".." => "",
        Some(idx) => &base[idx..],
    }
}

/// Drop every character that is not an ASCII letter or digit.
pub fn sanitize(base: &str) -> String {
    base.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
