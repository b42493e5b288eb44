use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio containers the backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    Ogg,
    M4a,
    Mp3,
    Flac,
    Wav,
}

/// Probe order when opening a device: compressed containers first to keep
/// uploads small, WAV last since every device can produce it.
pub const DEFAULT_PREFERENCE: [AudioEncoding; 5] = [
    AudioEncoding::Ogg,
    AudioEncoding::M4a,
    AudioEncoding::Mp3,
    AudioEncoding::Flac,
    AudioEncoding::Wav,
];

impl AudioEncoding {
    /// File extension understood by the backend
    pub fn extension(&self) -> &'static str {
        match self {
            AudioEncoding::Ogg => "ogg",
            AudioEncoding::M4a => "m4a",
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::Flac => "flac",
            AudioEncoding::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioEncoding::Ogg => "audio/ogg",
            AudioEncoding::M4a => "audio/mp4",
            AudioEncoding::Mp3 => "audio/mpeg",
            AudioEncoding::Flac => "audio/flac",
            AudioEncoding::Wav => "audio/wav",
        }
    }

    /// Case-insensitive lookup by extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ogg" | "oga" | "opus" => Some(AudioEncoding::Ogg),
            "m4a" | "mp4" => Some(AudioEncoding::M4a),
            "mp3" => Some(AudioEncoding::Mp3),
            "flac" => Some(AudioEncoding::Flac),
            "wav" | "wave" => Some(AudioEncoding::Wav),
            _ => None,
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Pick the first encoding in `preference` the device can produce
pub fn negotiate<F>(preference: &[AudioEncoding], supports: F) -> Option<AudioEncoding>
where
    F: Fn(AudioEncoding) -> bool,
{
    preference.iter().copied().find(|&encoding| supports(encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_takes_first_supported() {
        let picked = negotiate(&DEFAULT_PREFERENCE, |e| {
            matches!(e, AudioEncoding::Mp3 | AudioEncoding::Wav)
        });
        assert_eq!(picked, Some(AudioEncoding::Mp3));
    }

    #[test]
    fn test_negotiate_respects_custom_order() {
        let order = [AudioEncoding::Wav, AudioEncoding::Ogg];
        let picked = negotiate(&order, |_| true);
        assert_eq!(picked, Some(AudioEncoding::Wav));
    }

    #[test]
    fn test_negotiate_nothing_supported() {
        assert_eq!(negotiate(&DEFAULT_PREFERENCE, |_| false), None);
        assert_eq!(negotiate(&[], |_| true), None);
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(AudioEncoding::from_extension("WAV"), Some(AudioEncoding::Wav));
        assert_eq!(AudioEncoding::from_extension("opus"), Some(AudioEncoding::Ogg));
        assert_eq!(AudioEncoding::from_extension("webm"), None);

        for encoding in DEFAULT_PREFERENCE {
            assert_eq!(AudioEncoding::from_extension(encoding.extension()), Some(encoding));
        }
    }

    #[test]
    fn test_serde_names_match_extensions() {
        let json = serde_json::to_string(&AudioEncoding::M4a).unwrap();
        assert_eq!(json, "\"m4a\"");

        let parsed: AudioEncoding = serde_json::from_str("\"flac\"").unwrap();
        assert_eq!(parsed, AudioEncoding::Flac);
    }
}
