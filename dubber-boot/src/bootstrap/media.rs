//! Media binary capability probe

use crate::bootstrap::host::Host;
use serde::Serialize;

/// NVIDIA hardware H.264 encoder name as listed by `ffmpeg -encoders`
pub const NVENC_ENCODER: &str = "h264_nvenc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaCapabilities {
    pub binary: String,
    pub h264_nvenc: bool,
}

/// Whether an `ffmpeg -encoders` listing contains `encoder`.
///
/// Listing rows look like ` V....D h264_nvenc    NVIDIA NVENC H.264 encoder`;
/// the name is the second column.
pub fn encoders_include(listing: &str, encoder: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|name| name == encoder)
}

pub async fn detect_capabilities<H: Host + ?Sized>(host: &H, binary: &str) -> MediaCapabilities {
    let listing = host.capture(binary, &["-hide_banner", "-encoders"]).await;
    let h264_nvenc = listing.is_some_and(|out| encoders_include(&out, NVENC_ENCODER));
    tracing::debug!("{} h264_nvenc: {}", binary, h264_nvenc);

    MediaCapabilities {
        binary: binary.to_string(),
        h264_nvenc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::host::fake::FakeHost;

    const LISTING: &str = "Encoders:
 V..... = Video
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
";

    #[test]
    fn test_encoders_include() {
        assert!(encoders_include(LISTING, "h264_nvenc"));
        assert!(encoders_include(LISTING, "aac"));
        assert!(!encoders_include(LISTING, "hevc_nvenc"));
        // Description text is not an encoder name.
        assert!(!encoders_include(LISTING, "NVIDIA"));
    }

    #[tokio::test]
    async fn test_detect_capabilities() {
        let host = FakeHost::new().with_output("ffmpeg -hide_banner -encoders", LISTING);
        let caps = detect_capabilities(&host, "ffmpeg").await;
        assert!(caps.h264_nvenc);

        let silent = FakeHost::new();
        assert!(!detect_capabilities(&silent, "ffmpeg").await.h264_nvenc);
    }
}
