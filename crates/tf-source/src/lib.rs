/// Visual source modules for termframe (image, video) and the frame scaler.

pub mod image;
pub mod resize;

#[cfg(feature = "video")]
pub mod video;

use std::path::Path;

/// Extensions image reconnues.
pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Kind of source behind an identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Still image: one frame, no pacing.
    Image,
    /// Video file or stream URL: paced playback.
    Video,
}

impl SourceKind {
    /// Detect from the identifier's extension. URLs and unknown extensions are video.
    ///
    /// # Example
    /// ```
    /// use tf_source::SourceKind;
    /// assert_eq!(SourceKind::detect("Images/Image-10.JPG"), SourceKind::Image);
    /// assert_eq!(SourceKind::detect("https://host/large.mp4"), SourceKind::Video);
    /// ```
    #[must_use]
    pub fn detect(identifier: &str) -> Self {
        if identifier.contains("://") {
            return Self::Video;
        }
        let is_image = Path::new(identifier)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if is_image { Self::Image } else { Self::Video }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection() {
        assert_eq!(SourceKind::detect("a.png"), SourceKind::Image);
        assert_eq!(SourceKind::detect("dir.v2/clip.mkv"), SourceKind::Video);
        assert_eq!(SourceKind::detect("noext"), SourceKind::Video);
        assert_eq!(SourceKind::detect("http://x/y.png"), SourceKind::Video);
    }
}
